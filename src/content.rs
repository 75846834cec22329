//! Read-only views over repository content and the catalog that finds them.

use std::collections::BTreeSet;
use std::str::FromStr;

use anyhow::{Error, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const PUBLISHED: &str = "published";

/// Dublin Core and workflow metadata shared by every content object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct Metadata {
    pub(crate) id: String,
    /// Physical path in the repository, e.g. `/plone/places/579885`.
    pub(crate) path: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) modified: String,
    pub(crate) subjects: Vec<String>,
    pub(crate) creators: Vec<String>,
    pub(crate) contributors: Vec<String>,
    pub(crate) review_state: String,
    pub(crate) initial_provenance: String,
    pub(crate) references: Vec<Citation>,
    pub(crate) attestations: Vec<Attestation>,
    pub(crate) time_span: Option<TimeSpan>,
}

impl Metadata {
    pub(crate) fn is_published(&self) -> bool {
        self.review_state == PUBLISHED
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct Citation {
    pub(crate) identifier: String,
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) short_title: String,
    pub(crate) citation_detail: String,
    /// Older records keep the whole citation here.
    pub(crate) range: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct Attestation {
    pub(crate) time_period: String,
    pub(crate) confidence: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct TimeSpan {
    pub(crate) start: i64,
    pub(crate) end: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct Place {
    #[serde(flatten)]
    pub(crate) meta: Metadata,
    pub(crate) place_types: Vec<String>,
    /// Ids of places this place connects with.
    pub(crate) connections: Vec<String>,
    /// Set on errata: the path of the place this one duplicates.
    pub(crate) remote_url: Option<String>,
    pub(crate) modern_location: String,
    pub(crate) location_precision: Option<String>,
}

impl Place {
    /// The precision that selects how a representative geometry is found.
    ///
    /// An explicit indicator on the place wins; otherwise any precise child
    /// location makes the place precise, and any rough one makes it rough.
    pub(crate) fn precision(&self, locations: &[Location]) -> Option<Precision> {
        if let Some(flag) = &self.location_precision {
            return flag.parse().ok();
        }
        let flags: Vec<_> = locations.iter().filter_map(Location::precision).collect();
        if flags.contains(&Precision::Precise) {
            Some(Precision::Precise)
        } else if flags.contains(&Precision::Rough) {
            Some(Precision::Rough)
        } else {
            None
        }
    }

    pub(crate) fn is_erratum(&self) -> bool {
        self.remote_url
            .as_deref()
            .is_some_and(|remote| !remote.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct Name {
    #[serde(flatten)]
    pub(crate) meta: Metadata,
    pub(crate) name_attested: String,
    /// Comma separated romanizations.
    pub(crate) name_transliterated: String,
    pub(crate) name_language: String,
}

impl Name {
    pub(crate) fn romanizations(&self) -> impl Iterator<Item = &str> {
        self.name_transliterated
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct Location {
    #[serde(flatten)]
    pub(crate) meta: Metadata,
    /// GeoJSON geometry, or an object with only a `bbox`.
    pub(crate) geometry: Option<Value>,
    /// External location reference, e.g. a grid cell identifier.
    pub(crate) location: String,
    pub(crate) precision: Option<String>,
}

impl Location {
    pub(crate) fn precision(&self) -> Option<Precision> {
        self.precision.as_deref().and_then(|p| p.parse().ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Precision {
    Precise,
    Rough,
}

impl FromStr for Precision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "precise" => Ok(Precision::Precise),
            "rough" => Ok(Precision::Rough),
            other => bail!("unrecognized location precision {other:?}"),
        }
    }
}

/// A site member account.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct Member {
    pub(crate) id: String,
    pub(crate) fullname: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlaceQuery {
    Ids(Vec<String>),
    /// Inclusive on both ends.
    Range { min: String, max: String },
}

impl PlaceQuery {
    pub(crate) fn matches(&self, id: &str) -> bool {
        match self {
            PlaceQuery::Ids(ids) => ids.iter().any(|i| i == id),
            PlaceQuery::Range { min, max } => min.as_str() <= id && id <= max.as_str(),
        }
    }
}

/// Query interface over the content repository.
///
/// Children come back in catalog order (sorted by id) regardless of their
/// workflow state; callers decide what is visible.
pub(crate) trait Catalog {
    fn place(&self, id: &str) -> Result<Option<Place>>;
    fn names(&self, place: &Place) -> Result<Vec<Name>>;
    fn locations(&self, place: &Place) -> Result<Vec<Location>>;
    /// Places connected in either direction.
    fn connections(&self, place: &Place) -> Result<Vec<Place>>;
    fn member(&self, username: &str) -> Result<Option<Member>>;
    /// Every distinct creator and contributor seen on any content object.
    fn principals(&self) -> Result<BTreeSet<String>>;
    /// Ids of published places matching `query`, sorted.
    fn place_ids(&self, query: &PlaceQuery) -> Result<Vec<String>>;
    /// Releases whatever read state the catalog accumulated so far.
    fn checkpoint(&mut self) -> Result<()> {
        Ok(())
    }
}
