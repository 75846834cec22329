//! Just enough RDF: terms, an ordered deduplicating graph, and the two
//! serializations the gazetteer publishes.

mod graph;
mod serialize;
mod term;

pub mod namespace;

pub use graph::Graph;
pub use namespace::{
    Namespace, cito, dcterms, foaf, geo, osgeo, osspatial, owl, pleiades, prov, rdf, rdfs, skos,
    spatial, xsd,
};
pub use serialize::Format;
pub use term::{BlankNode, Iri, Literal, Object, Subject, Triple};
