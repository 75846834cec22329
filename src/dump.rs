//! Offline bulk dumps of authors, vocabularies and places as Turtle.

use std::fmt::{self, Display};
use std::io::Write;

use anyhow::{Result, bail};
use graph::{Format, Graph};
use tracing::{info, warn};

use crate::config::DumpConfig;
use crate::content::{Catalog, PlaceQuery};
use crate::grapher::{Grapher, RenderContext};

/// What a single dump run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DumpMode {
    Authors,
    Vocabulary(String),
    Places(Vec<String>),
    /// Inclusive id range.
    PlaceRange { min: String, max: String },
}

impl DumpMode {
    /// Validates the command line selection. At most one of authors,
    /// vocabulary and places may be given.
    pub(crate) fn from_options(
        authors: bool,
        vocabulary: Option<&str>,
        places: Option<&str>,
        range: bool,
    ) -> Result<DumpMode> {
        let vocabulary = vocabulary.filter(|v| !v.is_empty());
        let places = places.filter(|p| !p.is_empty());
        let selected = [authors, vocabulary.is_some(), places.is_some()]
            .iter()
            .filter(|s| **s)
            .count();
        if selected > 1 {
            bail!("-a, -p, and -v options are exclusive");
        }
        if authors {
            return Ok(DumpMode::Authors);
        }
        if let Some(name) = vocabulary {
            return Ok(DumpMode::Vocabulary(name.to_string()));
        }
        let Some(places) = places else {
            bail!("No dump options provided");
        };
        let ids: Vec<String> = places
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        if !range {
            return Ok(DumpMode::Places(ids));
        }
        match ids.as_slice() {
            [min, max] => Ok(DumpMode::PlaceRange {
                min: min.clone(),
                max: max.clone(),
            }),
            _ => bail!("a place range needs exactly two ids, got {places}"),
        }
    }
}

impl Display for DumpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpMode::Authors => write!(f, "Pleiades Authors"),
            DumpMode::Vocabulary(name) => write!(f, "Pleiades Vocabulary '{name}'"),
            DumpMode::Places(ids) => write!(f, "Pleiades Places {}", ids.join(",")),
            DumpMode::PlaceRange { min, max } => write!(f, "Pleiades Places Range {min},{max}"),
        }
    }
}

/// Builds the graph for `mode` and writes it, header first, to `out`.
pub(crate) fn run<C, W>(
    catalog: &mut C,
    cx: &RenderContext,
    config: &DumpConfig,
    mode: &DumpMode,
    mut out: W,
) -> Result<()>
where
    C: Catalog,
    W: Write,
{
    let g = match mode {
        DumpMode::Authors => Grapher::new(&*catalog, cx).authors()?,
        DumpMode::Vocabulary(name) => match Grapher::new(&*catalog, cx).scheme(name)? {
            Some(g) => g,
            None => bail!("no vocabulary named {name}"),
        },
        DumpMode::Places(ids) => places(catalog, cx, config, &PlaceQuery::Ids(ids.clone()))?,
        DumpMode::PlaceRange { min, max } => {
            let query = PlaceQuery::Range {
                min: min.clone(),
                max: max.clone(),
            };
            places(catalog, cx, config, &query)?
        }
    };
    info!(target: "dump", contents = %mode, triples = g.len(), "dump complete");
    write_header(&mut out, config, mode, g.len())?;
    g.write(Format::Turtle, &mut out)?;
    out.flush()?;
    Ok(())
}

fn places<C: Catalog>(
    catalog: &mut C,
    cx: &RenderContext,
    config: &DumpConfig,
    query: &PlaceQuery,
) -> Result<Graph> {
    let ids = catalog.place_ids(query)?;
    info!(target: "dump", places = ids.len(), "dumping places");
    let batch_size = config.batch_size.max(1);
    let mut g = Graph::with_namespaces();
    for (count, id) in ids.iter().enumerate() {
        match place(&*catalog, cx, id) {
            Ok(Some(item)) => g.merge(item),
            Ok(None) => warn!(target: "dump", %id, "place vanished"),
            Err(error) => warn!(target: "dump", %id, %error, "place skipped"),
        }
        if (count + 1) % batch_size == 0 {
            catalog.checkpoint()?;
        }
    }
    Ok(g)
}

fn place<C: Catalog>(catalog: &C, cx: &RenderContext, id: &str) -> Result<Option<Graph>> {
    let Some(place) = catalog.place(id)? else {
        return Ok(None);
    };
    let grapher = Grapher::new(catalog, cx);
    let g = if place.is_erratum() {
        grapher.link(&place)?
    } else {
        grapher.place(&place, false)?
    };
    Ok(Some(g))
}

fn write_header<W: Write>(out: &mut W, config: &DumpConfig, mode: &DumpMode, triples: usize) -> Result<()> {
    writeln!(out, "# {}", config.title)?;
    writeln!(out, "# Contents: {mode}")?;
    writeln!(out, "# Date: {}", jiff::Timestamp::now())?;
    writeln!(out, "# License: {}", config.license)?;
    writeln!(out, "# Credits: {}", config.credits)?;
    writeln!(out, "# Triple count: {triples}")?;
    writeln!(out)?;
    Ok(())
}
