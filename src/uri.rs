//! Minting of subject and object URIs from repository paths.

use std::fmt::Write;

use anyhow::{Result, bail};
use graph::{Graph, Iri, owl};

use crate::config::SiteConfig;

/// Characters never allowed raw in an emitted URI reference.
const RESERVED: &[char] = &[
    '<', '>', '"', ' ', '{', '}', '|', '\\', '^', '`', '[', ']', '%', '#', '\t',
];

#[derive(Debug, Clone)]
pub(crate) struct UriBuilder {
    site_url: String,
    vh_root: Option<String>,
    primary_scheme: String,
    legacy_scheme: String,
    vocab_base: String,
    places_scheme: String,
    author_base: String,
}

impl UriBuilder {
    pub(crate) fn new(site: &SiteConfig, vocab_base: String) -> UriBuilder {
        let site_url = site.url.trim_end_matches('/').to_owned();
        let primary_scheme = site_url
            .split_once("://")
            .map(|(scheme, _)| scheme.to_owned())
            .unwrap_or_else(|| "https".to_owned());
        let vh_root = site
            .vh_root
            .as_deref()
            .map(|root| root.trim_end_matches('/'))
            .filter(|root| !root.is_empty())
            .map(str::to_owned);
        UriBuilder {
            site_url,
            vh_root,
            primary_scheme,
            legacy_scheme: site.legacy_scheme.clone(),
            vocab_base: vocab_base.trim_end_matches('/').to_owned(),
            places_scheme: site.places_scheme.clone(),
            author_base: site.author_base.clone(),
        }
    }

    /// Strips the virtual host root from the path of an absolute URL.
    pub(crate) fn public_url(&self, absolute_url: &str) -> String {
        let Some(vh_root) = self.vh_root.as_deref() else {
            return absolute_url.to_owned();
        };
        let Some(path_start) = path_offset(absolute_url) else {
            return absolute_url.to_owned();
        };
        let (origin, path) = absolute_url.split_at(path_start);
        match path.strip_prefix(vh_root) {
            Some(rest) if rest.is_empty() || rest.starts_with(['/', '#', '?']) => {
                format!("{origin}{rest}")
            }
            _ => absolute_url.to_owned(),
        }
    }

    /// Public URL of a repository object addressed by its physical path.
    pub(crate) fn object_url(&self, path: &str) -> String {
        let path = path.trim_end_matches('/');
        if path.starts_with('/') {
            self.public_url(&format!("{}{}", self.site_url, path))
        } else {
            self.public_url(&format!("{}/{}", self.site_url, path))
        }
    }

    /// Escapes `raw` into a URI reference. Empty input is unusable.
    pub(crate) fn build_uri(&self, raw: &str) -> Result<Iri> {
        build_uri(raw)
    }

    /// The subject URI of the repository object at `path`.
    pub(crate) fn subject(&self, path: &str) -> Result<Iri> {
        self.build_uri(&self.object_url(path))
    }

    /// The same URI in the legacy scheme, when it differs from `iri`.
    pub(crate) fn legacy_twin(&self, iri: &Iri) -> Option<Iri> {
        if self.primary_scheme == self.legacy_scheme {
            return None;
        }
        let rest = iri
            .as_str()
            .strip_prefix(&self.primary_scheme)?
            .strip_prefix("://")?;
        Some(Iri::new(format!("{}://{}", self.legacy_scheme, rest)))
    }

    /// Asserts equivalence of `iri` with its previously published form.
    pub(crate) fn alias(&self, graph: &mut Graph, iri: &Iri) {
        if let Some(twin) = self.legacy_twin(iri) {
            graph.add(iri, owl::SAME_AS, twin);
        }
    }

    pub(crate) fn places_scheme(&self) -> Result<Iri> {
        self.build_uri(&self.places_scheme)
    }

    pub(crate) fn vocabulary(&self, scheme: &str) -> Result<Iri> {
        self.build_uri(&format!("{}/{}", self.vocab_base, scheme))
    }

    pub(crate) fn concept(&self, scheme: &str, term: &str) -> Result<Iri> {
        self.build_uri(&format!("{}/{}/{}", self.vocab_base, scheme, term))
    }

    pub(crate) fn author(&self, username: &str) -> Result<Iri> {
        self.build_uri(&format!("{}{}", self.author_base, username))
    }
}

pub(crate) fn build_uri(raw: &str) -> Result<Iri> {
    let raw = raw.trim_matches(|c| c == ' ' || c == '\n' || c == '\r');
    if raw.is_empty() {
        bail!("cannot build a URI from an empty string");
    }
    Ok(Iri::new(escape(raw)))
}

pub(crate) fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if RESERVED.contains(&c) {
            let _ = write!(escaped, "%{:02X}", c as u32);
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Byte offset of the path in an absolute URL.
fn path_offset(url: &str) -> Option<usize> {
    let authority = url.find("://")? + 3;
    url[authority..].find('/').map(|i| authority + i)
}
