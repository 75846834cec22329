//! Rules turning repository content into RDF graphs.

mod concept;
mod metadata;
mod person;
mod place;

use anyhow::Result;
use graph::{Graph, Iri};

use crate::config::{Config, Lookups, SiteConfig};
use crate::content::{Catalog, Location, Name, Place};
use crate::geometry::GeometryResolver;
use crate::uri::UriBuilder;
use crate::vocab::VocabularyResolver;

/// Everything a render needs besides the catalog. Built once per process.
#[derive(Clone)]
pub(crate) struct RenderContext {
    pub(crate) uris: UriBuilder,
    pub(crate) lookups: Lookups,
    pub(crate) site: SiteConfig,
    pub(crate) grid_base: String,
}

impl RenderContext {
    pub(crate) fn new(config: &Config, lookups: Lookups) -> RenderContext {
        let site = config.site.clone();
        RenderContext {
            uris: UriBuilder::new(&site, config.vocab.base_url(&site)),
            lookups,
            site,
            grid_base: config.geo.grid_base.clone(),
        }
    }
}

/// Something that can be rendered on its own.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Entity<'e> {
    Place(&'e Place),
    Name(&'e Name),
    Location(&'e Location),
    Term { scheme: &'e str, id: &'e str },
    Person(&'e str),
}

pub(crate) struct Grapher<'a, C: ?Sized> {
    catalog: &'a C,
    cx: &'a RenderContext,
}

impl<'a, C: Catalog + ?Sized> Grapher<'a, C> {
    pub(crate) fn new(catalog: &'a C, cx: &'a RenderContext) -> Grapher<'a, C> {
        Grapher { catalog, cx }
    }

    pub(crate) fn graph(&self, entity: Entity<'_>) -> Result<Graph> {
        match entity {
            Entity::Place(place) if place.is_erratum() => self.link(place),
            Entity::Place(place) => self.place(place, true),
            Entity::Name(name) => {
                let mut g = Graph::with_namespaces();
                g.merge(self.name(None, name, true)?);
                Ok(g)
            }
            Entity::Location(location) => {
                let mut g = Graph::with_namespaces();
                g.merge(self.location(None, location, true)?);
                Ok(g)
            }
            Entity::Term { scheme, id } => {
                let mut g = Graph::with_namespaces();
                self.concept(scheme, id, &mut g);
                Ok(g)
            }
            Entity::Person(username) => {
                let mut g = Graph::with_namespaces();
                self.person(&mut g, username)?;
                Ok(g)
            }
        }
    }

    fn uris(&self) -> &UriBuilder {
        &self.cx.uris
    }

    fn vocab(&self) -> VocabularyResolver<'_> {
        VocabularyResolver::new(&self.cx.lookups.vocabularies, &self.cx.uris)
    }

    fn geometry(&self) -> GeometryResolver<'_> {
        GeometryResolver::new(&self.cx.grid_base, &self.cx.lookups.grids)
    }

    /// Subject URI of a content object, aliased to its legacy form.
    fn subject(&self, g: &mut Graph, path: &str) -> Result<Iri> {
        let subject = self.uris().subject(path)?;
        self.uris().alias(g, &subject);
        Ok(subject)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use graph::{Graph, Iri, Object, Triple};
    use serde_json::json;

    use crate::authority;
    use crate::config::{Config, Lookups};
    use crate::content::memory::MemoryCatalog;
    use crate::content::{Location, Member, Name, Place};
    use crate::geometry::{GridTable, MapSheet};
    use crate::vocab;

    use super::RenderContext;

    pub(crate) const ATHENAE: &str = "https://pleiades.stoa.org/places/579885";

    pub(crate) fn context() -> RenderContext {
        let grids = GridTable::from_sheets([MapSheet {
            id: "59".to_string(),
            bounds: [22.0, 37.0, 25.0, 39.0],
            columns: "ABC".to_string(),
            rows: 2,
        }]);
        let lookups = Lookups {
            vocabularies: Arc::new(vocab::tests::sample()),
            authority: Arc::new(authority::tests::sample()),
            grids: Arc::new(grids),
        };
        RenderContext::new(&Config::default(), lookups)
    }

    fn from_json<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).expect("fixture should deserialize")
    }

    pub(crate) fn athenae() -> Place {
        from_json(json!({
            "id": "579885",
            "path": "/plone/places/579885",
            "title": "Athenae",
            "description": "An ancient city. cited: BAtlas 59 c2",
            "modified": "2016-05-04T12:00:00Z",
            "subjects": ["dare:ancient=1"],
            "review_state": "published",
            "creators": ["sgillies"],
            "contributors": ["S. Gillies, thomase", "Barbara Levick"],
            "initial_provenance": "Barrington Atlas: BAtlas 59 C2 Athenae",
            "references": [
                {"identifier": "doi:10.5555/batlas", "type": "seeAlso",
                 "short_title": "BAtlas", "citation_detail": "59 C2 Athenae"}
            ],
            "place_types": ["settlement", "no-such-type", ""],
            "connections": ["580102"]
        }))
    }

    pub(crate) fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::default();
        let names: Vec<Name> = from_json(json!([
            {
                "id": "athenai",
                "path": "/plone/places/579885/athenai",
                "review_state": "published",
                "creators": ["Unknown Scholar"],
                "name_attested": "Ἀθῆναι",
                "name_language": "grc",
                "name_transliterated": "Athenai, Athenae",
                "attestations": [
                    {"time_period": "classical", "confidence": "confident"},
                    {"time_period": "roman", "confidence": "confident"}
                ]
            },
            {
                "id": "draft",
                "path": "/plone/places/579885/draft",
                "review_state": "private",
                "name_transliterated": "Athens"
            }
        ]));
        let locations: Vec<Location> = from_json(json!([
            {
                "id": "darmc-location",
                "path": "/plone/places/579885/darmc-location",
                "review_state": "published",
                "precision": "precise",
                "geometry": {"type": "Point", "coordinates": [23.7263, 37.9718]}
            },
            {
                "id": "batlas-location",
                "path": "/plone/places/579885/batlas-location",
                "review_state": "published",
                "precision": "rough",
                "location": "http://atlantides.org/capgrids/59/C2"
            }
        ]));
        catalog.add_place(athenae(), names, locations);
        let piraeus: Place = from_json(json!({
            "id": "580102",
            "path": "/plone/places/580102",
            "title": "Piraeus",
            "review_state": "published"
        }));
        catalog.add_place(piraeus, vec![], vec![]);
        let draft: Place = from_json(json!({
            "id": "1000",
            "path": "/plone/places/1000",
            "title": "Draft",
            "review_state": "private",
            "creators": ["juser"],
            "connections": ["579885"]
        }));
        catalog.add_place(draft, vec![], vec![]);
        for (id, fullname) in [("sgillies", "Sean Gillies"), ("thomase", "Tom Elliott")] {
            catalog.members.insert(
                id.to_string(),
                Member {
                    id: id.to_string(),
                    fullname: fullname.to_string(),
                },
            );
        }
        catalog
    }

    pub(crate) fn objects_of<'g>(g: &'g Graph, subject: &Iri, predicate: &Iri) -> Vec<&'g Object> {
        g.iter()
            .filter(|t| t.subject.as_iri() == Some(subject) && &t.predicate == predicate)
            .map(|t| &t.object)
            .collect()
    }

    pub(crate) fn has(g: &Graph, subject: &Iri, predicate: Iri, object: impl Into<Object>) -> bool {
        g.contains(&Triple::new(subject, predicate, object))
    }
}
