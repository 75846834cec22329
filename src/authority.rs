//! External authority table mapping display names to usernames and URIs.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AuthorityEntry {
    pub(crate) username: Option<String>,
    pub(crate) uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Row {
    label: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    uri: String,
}

fn non_empty(s: String) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_owned())
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Authority {
    entries: BTreeMap<String, AuthorityEntry>,
}

impl Authority {
    pub(crate) fn load(path: &Path) -> Result<Authority> {
        let reader = csv::Reader::from_path(path)
            .with_context(|| format!("unable to open authority table {}", path.display()))?;
        Authority::read(reader).with_context(|| format!("invalid authority table {}", path.display()))
    }

    pub(crate) fn read<R: Read>(mut reader: csv::Reader<R>) -> Result<Authority> {
        let mut entries = BTreeMap::new();
        for row in reader.deserialize() {
            let row: Row = row?;
            let entry = AuthorityEntry {
                username: non_empty(row.username),
                uri: non_empty(row.uri),
            };
            entries.insert(row.label.trim().to_owned(), entry);
        }
        Ok(Authority { entries })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, label: &str) -> Option<&AuthorityEntry> {
        self.entries.get(label.trim())
    }
}
