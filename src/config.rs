use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use fjall::Keyspace;
use serde::Deserialize;
use tracing::info;

use crate::authority::Authority;
use crate::geometry::GridTable;
use crate::grapher::RenderContext;
use crate::vocab::Vocabularies;

#[derive(Clone, Default, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) site: SiteConfig,
    pub(crate) vocab: VocabConfig,
    pub(crate) geo: GeoConfig,
    pub(crate) authority: AuthorityConfig,
    pub(crate) store: StoreConfig,
    pub(crate) http: HttpConfig,
    pub(crate) dump: DumpConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct SiteConfig {
    /// Absolute URL of the site root, in the primary scheme.
    pub(crate) url: String,
    /// Path segment a virtual host inserts in absolute URLs.
    pub(crate) vh_root: Option<String>,
    pub(crate) legacy_scheme: String,
    /// Repository path of the places folder.
    pub(crate) places_path: String,
    pub(crate) places_scheme: String,
    pub(crate) author_base: String,
    /// Test and demo accounts never listed as authors.
    pub(crate) placeholder_users: Vec<String>,
    /// Display names historically used in place of usernames.
    pub(crate) user_aliases: BTreeMap<String, String>,
}

#[derive(Clone, Default, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct VocabConfig {
    /// Defaults to `<site.url>/vocabularies`.
    pub(crate) base_url: Option<String>,
    pub(crate) path: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct GeoConfig {
    pub(crate) grid_base: String,
    pub(crate) grid_table: Option<PathBuf>,
}

#[derive(Clone, Default, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct AuthorityConfig {
    pub(crate) path: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct StoreConfig {
    pub(crate) path: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct HttpConfig {
    pub(crate) port: u16,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct DumpConfig {
    pub(crate) batch_size: usize,
    pub(crate) title: String,
    pub(crate) license: String,
    pub(crate) credits: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "https://pleiades.stoa.org".to_string(),
            vh_root: Some("/plone".to_string()),
            legacy_scheme: "http".to_string(),
            places_path: "/plone/places".to_string(),
            places_scheme: "https://pleiades.stoa.org/places".to_string(),
            author_base: "https://pleiades.stoa.org/author/".to_string(),
            placeholder_users: vec!["auser".to_string(), "juser".to_string()],
            user_aliases: BTreeMap::from([
                ("S. Gillies".to_string(), "sgillies".to_string()),
                ("T. Elliott".to_string(), "thomase".to_string()),
            ]),
        }
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            grid_base: "http://atlantides.org/capgrids/".to_string(),
            grid_table: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("keyspace"),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            title: "Pleiades RDF Dump".to_string(),
            license: "http://creativecommons.org/licenses/by/3.0/us/".to_string(),
            credits: "http://pleiades.stoa.org/credits".to_string(),
        }
    }
}

impl Config {
    pub(crate) fn load(path: Option<&Path>) -> Result<Config> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}

impl VocabConfig {
    pub(crate) fn base_url(&self, site: &SiteConfig) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("{}/vocabularies", site.url.trim_end_matches('/')))
    }
}

/// Process wide lookups, loaded once and read thereafter.
#[derive(Clone, Default)]
pub(crate) struct Lookups {
    pub(crate) vocabularies: Arc<Vocabularies>,
    pub(crate) authority: Arc<Authority>,
    pub(crate) grids: Arc<GridTable>,
}

impl Lookups {
    pub(crate) fn load(config: &Config) -> Result<Lookups> {
        let vocabularies = match &config.vocab.path {
            Some(path) => Vocabularies::load(path)?,
            None => Vocabularies::default(),
        };
        let authority = match &config.authority.path {
            Some(path) => Authority::load(path)?,
            None => Authority::default(),
        };
        let grids = match &config.geo.grid_table {
            Some(path) => GridTable::load(path)?,
            None => GridTable::default(),
        };
        info!(
            target: "lifecycle",
            schemes = vocabularies.len(),
            authorities = authority.len(),
            map_sheets = grids.len(),
            "lookups loaded"
        );
        Ok(Lookups {
            vocabularies: Arc::new(vocabularies),
            authority: Arc::new(authority),
            grids: Arc::new(grids),
        })
    }
}

/// Parsed configuration plus the process wide state derived from it.
#[derive(Clone)]
pub(crate) struct RuntimeConfig {
    pub(crate) init: Config,
    pub(crate) cx: RenderContext,
    pub(crate) keyspace: Keyspace,
}

impl RuntimeConfig {
    pub(crate) fn new(init: Config, lookups: Lookups, keyspace: Keyspace) -> RuntimeConfig {
        let cx = RenderContext::new(&init, lookups);
        RuntimeConfig { init, cx, keyspace }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::Config;

    #[test]
    fn partial_config_keeps_defaults() -> Result<()> {
        let config: Config = toml::from_str(
            r#"
            [site]
            url = "https://gazetteer.example.org"
            vh_root = "/plone"

            [dump]
            batch_size = 10
            "#,
        )?;
        assert_eq!(config.site.url, "https://gazetteer.example.org");
        assert_eq!(config.site.vh_root.as_deref(), Some("/plone"));
        assert_eq!(config.site.legacy_scheme, "http");
        assert_eq!(config.dump.batch_size, 10);
        assert_eq!(config.geo.grid_base, "http://atlantides.org/capgrids/");
        assert_eq!(
            config.vocab.base_url(&config.site),
            "https://gazetteer.example.org/vocabularies"
        );
        Ok(())
    }
}
