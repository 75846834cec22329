use std::collections::BTreeSet;

use anyhow::Result;
use graph::{
    Graph, Iri, Literal, dcterms, foaf, geo, osgeo, osspatial, owl, pleiades, rdf, rdfs, skos,
    spatial,
};
use tracing::{debug, warn};

use crate::content::{Catalog, Location, Name, Place};
use crate::geometry::{GridCell, LocationGeometry, Resolution};
use crate::vocab::PLACE_TYPES;

use super::Grapher;

const BATLAS_CITE: &str = "cited: BAtlas ";

/// Geographic context of a place: its modern location, else the atlas grid
/// its description cites.
pub(crate) fn geo_context(place: &Place) -> Option<String> {
    let note = match place.modern_location.trim() {
        "" => atlas_grid(&place.meta.description)?,
        modern => modern.to_owned(),
    };
    Some(note.replace(['\u{ae}', '\u{2192}'], "\u{2194}"))
}

fn atlas_grid(description: &str) -> Option<String> {
    let (_, rest) = description.split_once(BATLAS_CITE)?;
    let map_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (map, rest) = rest.split_at(map_len);
    let grid = rest.strip_prefix(' ')?;
    let grid_len = grid
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(grid.len());
    let grid = &grid[..grid_len];
    if map.is_empty() || grid.is_empty() {
        return None;
    }
    let mut chars = grid.chars();
    let first = chars.next()?;
    let grid: String = first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect();
    Some(format!("Barrington Atlas grid {map} {grid}"))
}

/// Authority part of an absolute URL.
fn add_extent(g: &mut Graph, cell: &GridCell) {
    g.add(&cell.extent, rdf::TYPE, osgeo::ABSTRACT_GEOMETRY);
    g.add(&cell.uri, osgeo::EXTENT, &cell.extent);
    g.add(&cell.extent, osgeo::AS_GEOJSON, Literal::new(cell.bounds.to_geojson()));
    g.add(&cell.extent, osgeo::AS_WKT, Literal::new(cell.bounds.to_wkt()));
}

impl<C: Catalog + ?Sized> Grapher<'_, C> {
    /// The full graph of a place: its document, the feature it describes,
    /// and every published name, location and connection.
    pub(crate) fn place(&self, place: &Place, include_vocab: bool) -> Result<Graph> {
        let mut g = Graph::with_namespaces();
        let doc = self.subject(&mut g, &place.meta.path)?;
        let feature = doc.with_fragment("this");
        self.uris().alias(&mut g, &feature);

        g.add(&doc, rdf::TYPE, pleiades::PLACE);
        g.add(&doc, rdf::TYPE, skos::CONCEPT);
        g.add(&doc, skos::IN_SCHEME, self.uris().places_scheme()?);
        g.add(&doc, skos::PREF_LABEL, Literal::new(&place.meta.title));

        g.add(&feature, rdf::TYPE, spatial::FEATURE);
        g.add(&feature, foaf::PRIMARY_TOPIC_OF, &doc);
        g.add(&feature, rdfs::LABEL, Literal::new(&place.meta.title));
        g.add(&feature, rdfs::COMMENT, Literal::new(&place.meta.description));

        self.dcterms(&place.meta, &mut g)?;
        self.provenance(&place.meta, &mut g, &doc);
        self.place_types(place, &mut g, &doc, include_vocab);

        for name in self.catalog.names(place)? {
            if !name.meta.is_published() {
                continue;
            }
            match self.name(Some(&doc), &name, include_vocab) {
                Ok(child) => g.merge(child),
                Err(error) => {
                    warn!(target: "grapher", path = %name.meta.path, %error, "name skipped");
                }
            }
        }

        let locations: Vec<Location> = self
            .catalog
            .locations(place)?
            .into_iter()
            .filter(|l| l.meta.is_published())
            .collect();
        self.representative_geometry(place, &locations, &mut g, &doc);
        for location in &locations {
            match self.location(Some(&doc), location, include_vocab) {
                Ok(child) => g.merge(child),
                Err(error) => {
                    warn!(target: "grapher", path = %location.meta.path, %error, "location skipped");
                }
            }
        }

        self.connections(place, &mut g, &doc, &feature)?;

        if let Some(coverage) = geo_context(place) {
            g.add(&doc, dcterms::COVERAGE, Literal::new(coverage));
        }
        self.references(&place.meta, &mut g, &doc);
        debug!(target: "grapher", path = %place.meta.path, triples = g.len(), "place graphed");
        Ok(g)
    }

    fn place_types(&self, place: &Place, g: &mut Graph, doc: &Iri, include_vocab: bool) {
        let vocab = self.vocab();
        let types: BTreeSet<&str> = place
            .place_types
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        for place_type in types {
            let Some(concept) = vocab.resolve_concept(PLACE_TYPES, place_type) else {
                continue;
            };
            g.add(doc, pleiades::HAS_FEATURE_TYPE, &concept.uri);
            if include_vocab {
                self.concept_triples(&concept, g);
            }
        }
    }

    fn representative_geometry(&self, place: &Place, locations: &[Location], g: &mut Graph, doc: &Iri) {
        let precision = place.precision(locations);
        match self.geometry().resolve(precision, locations) {
            Resolution::Point(point) => {
                g.add(doc, geo::LAT, Literal::double(point.lat));
                g.add(doc, geo::LONG, Literal::double(point.long));
            }
            Resolution::Grids(cells) => {
                for cell in &cells {
                    g.add(doc, osspatial::WITHIN, &cell.uri);
                    add_extent(g, cell);
                }
            }
            Resolution::None => {}
        }
    }

    /// Triples of one name. `place` links the name to its place.
    pub(crate) fn name(&self, place: Option<&Iri>, name: &Name, include_vocab: bool) -> Result<Graph> {
        let mut g = Graph::new();
        let subject = self.subject(&mut g, &name.meta.path)?;
        let label = if name.name_attested.is_empty() {
            &name.name_transliterated
        } else {
            &name.name_attested
        };
        if let Some(place) = place {
            g.add(place, skos::ALT_LABEL, Literal::lang(label, &name.name_language));
            g.add(place, pleiades::HAS_NAME, &subject);
        }
        g.add(&subject, rdf::TYPE, pleiades::NAME);
        self.dcterms(&name.meta, &mut g)?;
        self.temporal(&name.meta, &mut g, &subject, include_vocab);
        self.provenance(&name.meta, &mut g, &subject);
        self.references(&name.meta, &mut g, &subject);
        if !name.name_attested.is_empty() {
            g.add(
                &subject,
                pleiades::NAME_ATTESTED,
                Literal::lang(&name.name_attested, &name.name_language),
            );
        }
        for romanized in name.romanizations() {
            g.add(&subject, pleiades::NAME_ROMANIZED, Literal::new(romanized));
        }
        Ok(g)
    }

    /// Triples of one location. A geometry that cannot be read is logged
    /// and left out; the rest of the location stands.
    pub(crate) fn location(&self, place: Option<&Iri>, location: &Location, include_vocab: bool) -> Result<Graph> {
        let mut g = Graph::new();
        let subject = self.subject(&mut g, &location.meta.path)?;
        if let Some(place) = place {
            g.add(place, pleiades::HAS_LOCATION, &subject);
        }
        g.add(&subject, rdf::TYPE, pleiades::LOCATION);
        self.dcterms(&location.meta, &mut g)?;
        self.temporal(&location.meta, &mut g, &subject, include_vocab);
        self.provenance(&location.meta, &mut g, &subject);
        self.references(&location.meta, &mut g, &subject);
        match self.geometry().location_geometry(location) {
            Ok(LocationGeometry::Grids(cells)) => {
                for cell in &cells {
                    g.add(&subject, osspatial::PARTIALLY_OVERLAPS, &cell.uri);
                    add_extent(&mut g, cell);
                }
            }
            Ok(LocationGeometry::Shape(shape)) => {
                g.add(&subject, osgeo::AS_GEOJSON, Literal::new(shape.to_geojson().to_string()));
                g.add(&subject, osgeo::AS_WKT, Literal::new(shape.to_wkt()));
            }
            Ok(LocationGeometry::None) => {}
            Err(error) => {
                warn!(target: "grapher", path = %location.meta.path, %error, "location geometry skipped");
            }
        }
        Ok(g)
    }

    fn connections(&self, place: &Place, g: &mut Graph, doc: &Iri, feature: &Iri) -> Result<()> {
        for other in self.catalog.connections(place)? {
            if !other.meta.is_published() {
                continue;
            }
            match self.uris().subject(&other.meta.path) {
                Ok(other_doc) => {
                    g.add(feature, spatial::CONNECTS, other_doc.with_fragment("this"));
                    g.add(doc, rdfs::SEE_ALSO, other_doc);
                }
                Err(error) => {
                    warn!(target: "grapher", path = %other.meta.path, %error, "connection skipped");
                }
            }
        }
        Ok(())
    }

    /// Equivalence of an erratum with the place it duplicates.
    pub(crate) fn link(&self, place: &Place) -> Result<Graph> {
        let mut g = Graph::with_namespaces();
        let Some(remote) = place.remote_url.as_deref().map(str::trim).filter(|r| !r.is_empty()) else {
            return Ok(g);
        };
        let feature = self.uris().subject(&place.meta.path)?.with_fragment("this");
        self.uris().alias(&mut g, &feature);
        let target = if remote.contains("://") {
            self.uris().build_uri(&self.uris().public_url(remote))?
        } else {
            self.uris().subject(remote)?
        };
        let target = target.with_fragment("this");
        self.uris().alias(&mut g, &target);
        g.add(&feature, owl::SAME_AS, target);
        Ok(g)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use graph::{
        Graph, Iri, Literal, Object, dcterms, geo, osgeo, osspatial, owl, pleiades, rdf, rdfs,
        skos, spatial,
    };
    use serde_json::json;

    use crate::content::{Location, Place};
    use crate::grapher::Grapher;
    use crate::grapher::fixtures::{ATHENAE, athenae, catalog, context, has, objects_of};

    use super::{atlas_grid, geo_context};

    fn athenae_graph() -> Result<Graph> {
        let catalog = catalog();
        let cx = context();
        Grapher::new(&catalog, &cx).place(&athenae(), true)
    }

    #[test]
    fn place_is_idempotent_modulo_blank_nodes() -> Result<()> {
        let catalog = catalog();
        let cx = context();
        let grapher = Grapher::new(&catalog, &cx);
        let first = grapher.place(&athenae(), true)?;
        let second = grapher.place(&athenae(), true)?;
        assert!(first.eq_modulo_blank_nodes(&second));
        assert_eq!(first.len(), second.len());
        Ok(())
    }

    #[test]
    fn place_and_feature() -> Result<()> {
        let g = athenae_graph()?;
        let doc = Iri::new(ATHENAE);
        let feature = doc.with_fragment("this");
        assert!(has(&g, &doc, rdf::TYPE, pleiades::PLACE));
        assert!(has(&g, &doc, rdf::TYPE, skos::CONCEPT));
        assert!(has(&g, &doc, skos::IN_SCHEME, Iri::new("https://pleiades.stoa.org/places")));
        assert!(has(&g, &doc, skos::PREF_LABEL, Literal::new("Athenae")));
        assert!(has(&g, &feature, rdf::TYPE, spatial::FEATURE));
        assert!(has(&g, &feature, graph::foaf::PRIMARY_TOPIC_OF, doc.clone()));
        assert!(has(&g, &feature, rdfs::LABEL, Literal::new("Athenae")));
        assert!(has(&g, &doc, owl::SAME_AS, Iri::new("http://pleiades.stoa.org/places/579885")));
        assert!(has(&g, &feature, owl::SAME_AS, Iri::new("http://pleiades.stoa.org/places/579885#this")));
        assert!(has(
            &g,
            &doc,
            pleiades::HAS_FEATURE_TYPE,
            Iri::new("https://pleiades.stoa.org/vocabularies/place-types/settlement")
        ));
        assert_eq!(objects_of(&g, &doc, &pleiades::HAS_FEATURE_TYPE).len(), 1);
        assert!(has(&g, &doc, dcterms::COVERAGE, Literal::new("Barrington Atlas grid 59 C2")));
        Ok(())
    }

    #[test]
    fn published_names_only() -> Result<()> {
        let g = athenae_graph()?;
        let doc = Iri::new(ATHENAE);
        let name = Iri::new("https://pleiades.stoa.org/places/579885/athenai");
        assert_eq!(objects_of(&g, &doc, &pleiades::HAS_NAME), vec![&Object::from(&name)]);
        assert!(has(&g, &doc, skos::ALT_LABEL, Literal::lang("Ἀθῆναι", "grc")));
        assert!(has(&g, &name, rdf::TYPE, pleiades::NAME));
        assert!(has(&g, &name, pleiades::NAME_ATTESTED, Literal::lang("Ἀθῆναι", "grc")));
        assert!(has(&g, &name, pleiades::NAME_ROMANIZED, Literal::new("Athenai")));
        assert!(has(&g, &name, pleiades::NAME_ROMANIZED, Literal::new("Athenae")));
        assert!(has(&g, &name, pleiades::START_DATE, Literal::integer(-550)));
        assert!(has(&g, &name, owl::SAME_AS, Iri::new("http://pleiades.stoa.org/places/579885/athenai")));
        let period = Iri::new("https://pleiades.stoa.org/vocabularies/time-periods/classical");
        assert!(has(&g, &period, rdf::TYPE, skos::CONCEPT));
        assert!(!g.iter().any(|t| t.subject.as_iri().is_some_and(|s| s.as_str().ends_with("/draft"))));
        Ok(())
    }

    #[test]
    fn precise_place_gets_a_point() -> Result<()> {
        let g = athenae_graph()?;
        let doc = Iri::new(ATHENAE);
        assert!(has(&g, &doc, geo::LAT, Literal::double(37.9718)));
        assert!(has(&g, &doc, geo::LONG, Literal::double(23.7263)));
        assert!(objects_of(&g, &doc, &osspatial::WITHIN).is_empty());
        Ok(())
    }

    #[test]
    fn locations_carry_their_geometry() -> Result<()> {
        let g = athenae_graph()?;
        let doc = Iri::new(ATHENAE);
        let darmc = Iri::new("https://pleiades.stoa.org/places/579885/darmc-location");
        let batlas = Iri::new("https://pleiades.stoa.org/places/579885/batlas-location");
        assert!(has(&g, &doc, pleiades::HAS_LOCATION, darmc.clone()));
        assert!(has(&g, &darmc, rdf::TYPE, pleiades::LOCATION));
        assert!(has(&g, &darmc, osgeo::AS_WKT, Literal::new("POINT (23.7263 37.9718)")));
        let cell = Iri::new("http://atlantides.org/capgrids/59#C2");
        let extent = Iri::new("http://atlantides.org/capgrids/59#C2-extent");
        assert!(has(&g, &batlas, osspatial::PARTIALLY_OVERLAPS, cell.clone()));
        assert!(has(&g, &cell, osgeo::EXTENT, extent.clone()));
        assert!(has(&g, &extent, rdf::TYPE, osgeo::ABSTRACT_GEOMETRY));
        assert!(has(&g, &extent, osgeo::AS_WKT, Literal::new("POLYGON ((25 37, 25 38, 24 38, 24 37, 25 37))")));
        Ok(())
    }

    #[test]
    fn rough_place_is_within_grid_cells() -> Result<()> {
        let mut catalog = catalog();
        let cx = context();
        let place = Place {
            location_precision: Some("rough".to_string()),
            ..athenae()
        };
        let location: Location = serde_json::from_value(json!({
            "id": "grid",
            "path": "/plone/places/579885/grid",
            "review_state": "published",
            "location": "http://atlantides.org/capgrids/59/A1+B2"
        }))?;
        catalog.add_place(place.clone(), vec![], vec![location]);
        let g = Grapher::new(&catalog, &cx).place(&place, false)?;
        let doc = Iri::new(ATHENAE);
        let within = objects_of(&g, &doc, &osspatial::WITHIN);
        assert_eq!(within.len(), 2);
        let extents: Vec<_> = g
            .iter()
            .filter(|t| t.predicate == osgeo::EXTENT)
            .collect();
        assert_eq!(extents.len(), 2);
        for extent in extents {
            let node = extent.object.as_iri().expect("extent should be a URI");
            assert_eq!(objects_of(&g, node, &osgeo::AS_GEOJSON).len(), 1);
            assert_eq!(objects_of(&g, node, &osgeo::AS_WKT).len(), 1);
        }
        assert!(objects_of(&g, &doc, &geo::LAT).is_empty());
        Ok(())
    }

    #[test]
    fn published_connections_both_ways() -> Result<()> {
        let g = athenae_graph()?;
        let doc = Iri::new(ATHENAE);
        let feature = doc.with_fragment("this");
        assert!(has(&g, &feature, spatial::CONNECTS, Iri::new("https://pleiades.stoa.org/places/580102#this")));
        assert!(has(&g, &doc, rdfs::SEE_ALSO, Iri::new("https://pleiades.stoa.org/places/580102")));
        assert_eq!(objects_of(&g, &feature, &spatial::CONNECTS).len(), 1);
        Ok(())
    }

    #[test]
    fn bad_geometry_leaves_the_location() -> Result<()> {
        let mut catalog = catalog();
        let cx = context();
        let location: Location = serde_json::from_value(json!({
            "id": "broken",
            "path": "/plone/places/579885/broken",
            "review_state": "published",
            "geometry": {"type": "Circle", "coordinates": [0, 0]}
        }))?;
        catalog.add_place(athenae(), vec![], vec![location]);
        let g = Grapher::new(&catalog, &cx).place(&athenae(), false)?;
        let broken = Iri::new("https://pleiades.stoa.org/places/579885/broken");
        assert!(has(&g, &broken, rdf::TYPE, pleiades::LOCATION));
        assert!(objects_of(&g, &broken, &osgeo::AS_WKT).is_empty());
        assert!(has(&g, &Iri::new(ATHENAE), rdf::TYPE, pleiades::PLACE));
        Ok(())
    }

    #[test]
    fn erratum_links_to_its_target() -> Result<()> {
        let catalog = catalog();
        let cx = context();
        let grapher = Grapher::new(&catalog, &cx);
        let feature = Iri::new("https://pleiades.stoa.org/places/579885#this");
        let target = Iri::new("https://pleiades.stoa.org/places/580102#this");
        for remote in [
            "/plone/places/580102",
            "/plone/places/580102/",
            "https://pleiades.stoa.org/plone/places/580102",
            "https://pleiades.stoa.org/places/580102",
        ] {
            let erratum = Place {
                remote_url: Some(remote.to_string()),
                ..athenae()
            };
            let g = grapher.link(&erratum)?;
            assert!(has(&g, &feature, owl::SAME_AS, target.clone()), "{remote}");
            assert!(has(
                &g,
                &feature,
                owl::SAME_AS,
                Iri::new("http://pleiades.stoa.org/places/579885#this")
            ));
            assert!(has(
                &g,
                &target,
                owl::SAME_AS,
                Iri::new("http://pleiades.stoa.org/places/580102#this")
            ));
            assert!(!g.iter().any(|t| t.to_string().contains("/plone/")));
        }
        let erratum = Place {
            remote_url: Some("/plone/places/580102".to_string()),
            ..athenae()
        };
        let g = grapher.link(&erratum)?;
        assert!(grapher.link(&athenae())?.is_empty());
        assert_eq!(grapher.graph(crate::grapher::Entity::Place(&erratum))?, g);
        Ok(())
    }

    #[test]
    fn geographic_context() {
        let mut place = athenae();
        assert_eq!(geo_context(&place).as_deref(), Some("Barrington Atlas grid 59 C2"));
        place.modern_location = "Athína \u{2192} Piraeus".to_string();
        assert_eq!(geo_context(&place).as_deref(), Some("Athína \u{2194} Piraeus"));
        assert_eq!(atlas_grid("no citation here"), None);
        assert_eq!(atlas_grid("cited: BAtlas 100 b3x."), Some("Barrington Atlas grid 100 B3x".to_string()));
    }
}
