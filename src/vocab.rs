//! Controlled vocabularies: place types, time periods and whatever else the
//! site publishes as SKOS concept schemes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use graph::Iri;
use serde::Deserialize;
use tracing::warn;

use crate::uri::UriBuilder;

pub(crate) const PLACE_TYPES: &str = "place-types";
pub(crate) const TIME_PERIODS: &str = "time-periods";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Scheme {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) terms: Vec<Term>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Term {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) same_as: Option<String>,
    /// Bounding years, negative for BC.
    pub(crate) start: Option<i64>,
    pub(crate) end: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Vocabularies {
    schemes: BTreeMap<String, Scheme>,
}

impl Vocabularies {
    pub(crate) fn load(path: &Path) -> Result<Vocabularies> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read vocabularies {}", path.display()))?;
        let schemes = serde_json::from_str(&text)
            .with_context(|| format!("invalid vocabularies {}", path.display()))?;
        Ok(Vocabularies { schemes })
    }

    pub(crate) fn from_schemes(schemes: impl IntoIterator<Item = (String, Scheme)>) -> Vocabularies {
        Vocabularies {
            schemes: schemes.into_iter().collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.schemes.len()
    }

    pub(crate) fn scheme(&self, name: &str) -> Option<&Scheme> {
        self.schemes.get(name)
    }

    pub(crate) fn term(&self, scheme: &str, id: &str) -> Option<&Term> {
        self.scheme(scheme)?.terms.iter().find(|t| t.id == id)
    }
}

/// A vocabulary term ready to be graphed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Concept {
    pub(crate) uri: Iri,
    pub(crate) scheme: Iri,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) same_as: Option<String>,
}

pub(crate) struct VocabularyResolver<'a> {
    vocabularies: &'a Vocabularies,
    uris: &'a UriBuilder,
}

impl<'a> VocabularyResolver<'a> {
    pub(crate) fn new(vocabularies: &'a Vocabularies, uris: &'a UriBuilder) -> VocabularyResolver<'a> {
        VocabularyResolver { vocabularies, uris }
    }

    /// Missing schemes and terms are logged, never fatal.
    pub(crate) fn resolve_concept(&self, scheme: &str, term_id: &str) -> Option<Concept> {
        let Some(term) = self.vocabularies.term(scheme, term_id) else {
            warn!(target: "vocab", scheme, term = term_id, "no such vocabulary term");
            return None;
        };
        let uris = self
            .uris
            .concept(scheme, term_id)
            .and_then(|uri| Ok((uri, self.uris.vocabulary(scheme)?)));
        match uris {
            Ok((uri, scheme)) => Some(Concept {
                uri,
                scheme,
                title: term.title.clone(),
                description: term.description.clone(),
                same_as: term.same_as.clone().filter(|s| !s.trim().is_empty()),
            }),
            Err(error) => {
                warn!(target: "vocab", scheme, term = term_id, %error, "unusable term identifier");
                None
            }
        }
    }

    /// Every term of `scheme` in vocabulary order.
    pub(crate) fn concepts(&self, scheme: &str) -> Vec<Concept> {
        self.vocabularies
            .scheme(scheme)
            .map(|s| {
                s.terms
                    .iter()
                    .filter_map(|t| self.resolve_concept(scheme, &t.id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Smallest start and largest end over the periods that carry bounds.
    pub(crate) fn period_span<'p>(&self, periods: impl IntoIterator<Item = &'p str>) -> Option<(i64, i64)> {
        let terms: Vec<&Term> = periods
            .into_iter()
            .filter_map(|p| self.vocabularies.term(TIME_PERIODS, p))
            .collect();
        let start = terms.iter().filter_map(|t| t.start).min()?;
        let end = terms.iter().filter_map(|t| t.end).max()?;
        Some((start, end))
    }
}
