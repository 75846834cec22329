//! Content repository on fjall, and the JSON snapshot it is loaded from.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fjall::{Batch, Keyspace, PartitionCreateOptions, PartitionHandle, Slice, Snapshot};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::content::{Catalog, Location, Member, Metadata, Name, Place, PlaceQuery};

const NAME: &str = "name";
const LOCATION: &str = "location";

/// A place together with the objects it contains, as exported.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct PlaceRecord {
    #[serde(flatten)]
    pub(crate) place: Place,
    pub(crate) names: Vec<Name>,
    pub(crate) locations: Vec<Location>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct ContentSnapshot {
    pub(crate) places: Vec<PlaceRecord>,
    pub(crate) members: Vec<Member>,
}

impl ContentSnapshot {
    pub(crate) fn read(path: &Path) -> Result<ContentSnapshot> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read snapshot {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid snapshot {}", path.display()))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ImportStats {
    pub(crate) places: usize,
    pub(crate) names: usize,
    pub(crate) locations: usize,
    pub(crate) members: usize,
}

fn child_key(place: &str, kind: &str, child: &str) -> Vec<u8> {
    let mut key = vec![];
    key.extend_from_slice(place.as_bytes());
    key.push(0);
    key.extend_from_slice(kind.as_bytes());
    key.push(0);
    key.extend_from_slice(child.as_bytes());
    key
}

fn child_prefix(place: &str, kind: &str) -> Vec<u8> {
    child_key(place, kind, "")
}

fn edge_key(target: &str, source: &str) -> Vec<u8> {
    let mut key = vec![];
    key.extend_from_slice(target.as_bytes());
    key.push(0);
    key.extend_from_slice(source.as_bytes());
    key
}

/// Second NUL delimited component of an index key.
fn edge_source(key: &[u8]) -> Result<String> {
    let source = key
        .split(|&b| b == 0)
        .nth(1)
        .context("connection key should be NUL delimited")?;
    Ok(String::from_utf8(source.to_vec())?)
}

fn decode<T: DeserializeOwned>(bytes: &Slice) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn default_path(meta: &mut Metadata, parent: &str) {
    if meta.path.is_empty() {
        meta.path = format!("{}/{}", parent.trim_end_matches('/'), meta.id);
    }
}

#[derive(Clone)]
pub(crate) struct ContentStore {
    keyspace: Keyspace,
    places: PartitionHandle,
    children: PartitionHandle,
    connections_from: PartitionHandle,
    members: PartitionHandle,
    principals: PartitionHandle,
}

impl ContentStore {
    pub(crate) fn new(keyspace: Keyspace) -> Result<ContentStore> {
        let options = PartitionCreateOptions::default();
        let places = keyspace.open_partition("places", options.clone())?;
        let children = keyspace.open_partition("children", options.clone())?;
        let connections_from = keyspace.open_partition("connections_from", options.clone())?;
        let members = keyspace.open_partition("members", options.clone())?;
        let principals = keyspace.open_partition("principals", options)?;
        Ok(ContentStore {
            keyspace,
            places,
            children,
            connections_from,
            members,
            principals,
        })
    }

    /// Writes every record of `snapshot` in a single batch. Records without
    /// a path are filed under `places_path`.
    pub(crate) fn import(&self, snapshot: ContentSnapshot, places_path: &str) -> Result<ImportStats> {
        let mut batch = self.keyspace.batch();
        let mut stats = ImportStats::default();
        for record in snapshot.places {
            let PlaceRecord {
                mut place,
                names,
                locations,
            } = record;
            default_path(&mut place.meta, places_path);
            let id = place.meta.id.clone();
            for mut name in names {
                default_path(&mut name.meta, &place.meta.path);
                self.insert_principals(&mut batch, &name.meta);
                let key = child_key(&id, NAME, &name.meta.id);
                batch.insert(&self.children, key, serde_json::to_vec(&name)?);
                stats.names += 1;
            }
            for mut location in locations {
                default_path(&mut location.meta, &place.meta.path);
                self.insert_principals(&mut batch, &location.meta);
                let key = child_key(&id, LOCATION, &location.meta.id);
                batch.insert(&self.children, key, serde_json::to_vec(&location)?);
                stats.locations += 1;
            }
            for target in &place.connections {
                batch.insert(&self.connections_from, edge_key(target, &id), []);
            }
            self.insert_principals(&mut batch, &place.meta);
            batch.insert(&self.places, id.as_str(), serde_json::to_vec(&place)?);
            stats.places += 1;
        }
        for member in snapshot.members {
            batch.insert(&self.members, member.id.as_str(), serde_json::to_vec(&member)?);
            stats.members += 1;
        }
        batch.commit()?;
        info!(
            target: "store",
            places = stats.places,
            names = stats.names,
            locations = stats.locations,
            members = stats.members,
            "snapshot imported"
        );
        Ok(stats)
    }

    fn insert_principals(&self, batch: &mut Batch, meta: &Metadata) {
        for principal in meta.creators.iter().chain(&meta.contributors) {
            // principal lists may still be comma joined
            for username in principal.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                batch.insert(&self.principals, username, []);
            }
        }
    }

    /// A catalog reading one point in time of the store.
    pub(crate) fn reader(&self) -> StoreReader {
        let views = self.views();
        StoreReader {
            store: self.clone(),
            views,
        }
    }

    fn views(&self) -> Views {
        let instant = self.keyspace.instant();
        Views {
            places: self.places.snapshot_at(instant),
            children: self.children.snapshot_at(instant),
            connections_from: self.connections_from.snapshot_at(instant),
            members: self.members.snapshot_at(instant),
            principals: self.principals.snapshot_at(instant),
        }
    }
}

struct Views {
    places: Snapshot,
    children: Snapshot,
    connections_from: Snapshot,
    members: Snapshot,
    principals: Snapshot,
}

pub(crate) struct StoreReader {
    store: ContentStore,
    views: Views,
}

impl StoreReader {
    fn children<T: DeserializeOwned>(&self, place: &Place, kind: &str) -> Result<Vec<T>> {
        let mut result = vec![];
        for item in self.views.children.prefix(child_prefix(&place.meta.id, kind)) {
            let (_, bytes) = item?;
            result.push(decode(&bytes)?);
        }
        Ok(result)
    }
}

impl Catalog for StoreReader {
    fn place(&self, id: &str) -> Result<Option<Place>> {
        match self.views.places.get(id)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn names(&self, place: &Place) -> Result<Vec<Name>> {
        self.children(place, NAME)
    }

    fn locations(&self, place: &Place) -> Result<Vec<Location>> {
        self.children(place, LOCATION)
    }

    fn connections(&self, place: &Place) -> Result<Vec<Place>> {
        let mut ids = place.connections.clone();
        for item in self.views.connections_from.prefix(edge_key(&place.meta.id, "")) {
            let (key, _) = item?;
            ids.push(edge_source(&key)?);
        }
        let mut result = vec![];
        for id in ids {
            if let Some(other) = self.place(&id)? {
                result.push(other);
            }
        }
        Ok(result)
    }

    fn member(&self, username: &str) -> Result<Option<Member>> {
        match self.views.members.get(username)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn principals(&self) -> Result<BTreeSet<String>> {
        let mut result = BTreeSet::new();
        for item in self.views.principals.iter() {
            let (key, _) = item?;
            result.insert(String::from_utf8(key.to_vec())?);
        }
        Ok(result)
    }

    fn place_ids(&self, query: &PlaceQuery) -> Result<Vec<String>> {
        let mut ids = vec![];
        match query {
            PlaceQuery::Ids(wanted) => {
                for id in wanted {
                    if let Some(place) = self.place(id)?
                        && place.meta.is_published()
                    {
                        ids.push(place.meta.id);
                    }
                }
                ids.sort();
                ids.dedup();
            }
            PlaceQuery::Range { min, max } => {
                for item in self.views.places.range(min.as_str()..=max.as_str()) {
                    let (_, bytes) = item?;
                    let place: Place = decode(&bytes)?;
                    if place.meta.is_published() {
                        ids.push(place.meta.id);
                    }
                }
            }
        }
        Ok(ids)
    }

    /// Moves the read views to the current state so older versions can be
    /// reclaimed.
    fn checkpoint(&mut self) -> Result<()> {
        self.views = self.store.views();
        Ok(())
    }
}
