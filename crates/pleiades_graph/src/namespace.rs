//! Vocabularies used by gazetteer graphs.

use crate::Iri;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: &'static str,
    pub base: &'static str,
}

impl Namespace {
    pub const fn new(prefix: &'static str, base: &'static str) -> Namespace {
        Namespace { prefix, base }
    }

    pub fn term(&self, local: &str) -> Iri {
        Iri::new(format!("{}{}", self.base, local))
    }
}

/// Every namespace a place graph may use, in binding order.
pub const ALL: [Namespace; 14] = [
    cito::NS,
    dcterms::NS,
    foaf::NS,
    geo::NS,
    osgeo::NS,
    osspatial::NS,
    owl::NS,
    pleiades::NS,
    prov::NS,
    rdf::NS,
    rdfs::NS,
    skos::NS,
    spatial::NS,
    xsd::NS,
];

macro_rules! vocabulary {
    ($module:ident, $prefix:literal, $base:literal, { $($name:ident = $local:literal),* $(,)? }) => {
        pub mod $module {
            use crate::Iri;
            use super::Namespace;

            pub const NS: Namespace = Namespace::new($prefix, $base);
            $(pub const $name: Iri = Iri::const_iri(concat!($base, $local));)*
        }
    };
}

vocabulary!(cito, "cito", "http://purl.org/spar/cito/", {
    CITES_AS_RELATED = "citesAsRelated",
    CITES_FOR_INFORMATION = "citesForInformation",
});

vocabulary!(dcterms, "dcterms", "http://purl.org/dc/terms/", {
    TITLE = "title",
    DESCRIPTION = "description",
    MODIFIED = "modified",
    SUBJECT = "subject",
    CREATOR = "creator",
    CONTRIBUTOR = "contributor",
    COVERAGE = "coverage",
    BIBLIOGRAPHIC_CITATION = "bibliographicCitation",
});

vocabulary!(foaf, "foaf", "http://xmlns.com/foaf/0.1/", {
    PERSON = "Person",
    NAME = "name",
    PRIMARY_TOPIC_OF = "primaryTopicOf",
});

vocabulary!(geo, "geo", "http://www.w3.org/2003/01/geo/wgs84_pos#", {
    LAT = "lat",
    LONG = "long",
});

vocabulary!(osgeo, "osgeo", "http://data.ordnancesurvey.co.uk/ontology/geometry/", {
    ABSTRACT_GEOMETRY = "AbstractGeometry",
    EXTENT = "extent",
    AS_GEOJSON = "asGeoJSON",
    AS_WKT = "asWKT",
});

vocabulary!(osspatial, "osspatial", "http://data.ordnancesurvey.co.uk/ontology/spatialrelations/", {
    WITHIN = "within",
    PARTIALLY_OVERLAPS = "partiallyOverlaps",
});

vocabulary!(owl, "owl", "http://www.w3.org/2002/07/owl#", {
    SAME_AS = "sameAs",
});

vocabulary!(pleiades, "pleiades", "http://pleiades.stoa.org/places/vocab#", {
    PLACE = "Place",
    NAME = "Name",
    LOCATION = "Location",
    HAS_FEATURE_TYPE = "hasFeatureType",
    HAS_NAME = "hasName",
    HAS_LOCATION = "hasLocation",
    NAME_ATTESTED = "nameAttested",
    NAME_ROMANIZED = "nameRomanized",
    DURING = "during",
    START_DATE = "start_date",
    END_DATE = "end_date",
});

vocabulary!(prov, "prov", "http://www.w3.org/TR/prov-o/#", {
    WAS_DERIVED_FROM = "wasDerivedFrom",
});

vocabulary!(rdf, "rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#", {
    TYPE = "type",
});

vocabulary!(rdfs, "rdfs", "http://www.w3.org/2000/01/rdf-schema#", {
    LABEL = "label",
    COMMENT = "comment",
    SEE_ALSO = "seeAlso",
});

vocabulary!(skos, "skos", "http://www.w3.org/2004/02/skos/core#", {
    CONCEPT = "Concept",
    CONCEPT_SCHEME = "ConceptScheme",
    IN_SCHEME = "inScheme",
    PREF_LABEL = "prefLabel",
    ALT_LABEL = "altLabel",
    SCOPE_NOTE = "scopeNote",
});

vocabulary!(spatial, "spatial", "http://geovocab.org/spatial#", {
    FEATURE = "Feature",
    CONNECTS = "C",
});

vocabulary!(xsd, "xsd", "http://www.w3.org/2001/XMLSchema#", {
    DOUBLE = "double",
    INTEGER = "integer",
});
