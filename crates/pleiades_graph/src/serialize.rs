use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;

use anyhow::{Context, Error, Result, bail};
use rio_api::formatter::TriplesFormatter;
use rio_api::model as rio;
use rio_turtle::TurtleFormatter;
use rio_xml::RdfXmlFormatter;
use tracing::debug;

use crate::{Graph, Triple};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Turtle,
    RdfXml,
}

impl Format {
    pub fn media_type(&self) -> &'static str {
        match self {
            Format::Turtle => "text/turtle; charset=utf-8",
            Format::RdfXml => "application/rdf+xml",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Turtle => "ttl",
            Format::RdfXml => "rdf",
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "turtle" | "ttl" => Ok(Format::Turtle),
            "rdf" | "xml" | "pretty-xml" | "rdfxml" => Ok(Format::RdfXml),
            _ => bail!("unsupported RDF format {s}"),
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Format::Turtle => "turtle",
            Format::RdfXml => "rdf",
        })
    }
}

impl Graph {
    pub fn serialize(&self, format: Format) -> Result<String> {
        let mut buf = Vec::new();
        self.write(format, &mut buf)?;
        String::from_utf8(buf).context("serialized graph should be valid UTF-8")
    }

    pub fn write<W: Write>(&self, format: Format, mut writer: W) -> Result<()> {
        debug!(target: "graph", %format, triples = self.len(), "serialize");
        match format {
            Format::Turtle => {
                for (prefix, base) in self.prefixes() {
                    writeln!(writer, "@prefix {prefix}: <{base}> .")?;
                }
                writeln!(writer)?;
                let mut formatter = TurtleFormatter::new(writer);
                for triple in self {
                    formatter.format(&as_rio(triple))?;
                }
                formatter.finish()?;
            }
            Format::RdfXml => {
                let mut formatter = RdfXmlFormatter::with_indentation(writer, 2)?;
                for triple in self {
                    formatter.format(&as_rio(triple))?;
                }
                formatter.finish()?;
            }
        }
        Ok(())
    }
}

fn as_rio(triple: &Triple) -> rio::Triple<'_> {
    rio::Triple {
        subject: triple.subject.as_rio(),
        predicate: triple.predicate.as_rio(),
        object: triple.object.as_rio(),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::namespace::{geo, prov, rdf, rdfs, skos};
    use crate::{BlankNode, Graph, Iri, Literal};

    use super::Format;

    fn sample() -> Graph {
        let place = Iri::new("https://pleiades.stoa.org/places/579885");
        let mut g = Graph::with_namespaces();
        g.add(&place, rdf::TYPE, skos::CONCEPT);
        g.add(&place, skos::PREF_LABEL, Literal::lang("Athenae", "la"));
        g.add(&place, geo::LAT, Literal::double(37.97));
        let note = BlankNode::fresh();
        g.add(&place, prov::WAS_DERIVED_FROM, &note);
        g.add(&note, rdfs::LABEL, Literal::new("Barrington Atlas: BAtlas 59 C2 Athenae"));
        g
    }

    #[test]
    fn turtle_has_prefixes_and_statements() -> Result<()> {
        let text = sample().serialize(Format::Turtle)?;
        assert!(text.starts_with("@prefix cito: <http://purl.org/spar/cito/> ."));
        assert!(text.contains("<https://pleiades.stoa.org/places/579885>"));
        assert!(text.contains("\"Athenae\"@la"));
        assert!(text.contains("37.97"));
        Ok(())
    }

    #[test]
    fn rdfxml_document() -> Result<()> {
        let text = sample().serialize(Format::RdfXml)?;
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("rdf:RDF"));
        assert!(text.contains("Athenae"));
        Ok(())
    }

    #[test]
    fn format_names() -> Result<()> {
        assert_eq!("turtle".parse::<Format>()?, Format::Turtle);
        assert_eq!("rdf".parse::<Format>()?, Format::RdfXml);
        assert!("n3".parse::<Format>().is_err());
        assert_eq!(Format::Turtle.extension(), "ttl");
        assert_eq!(Format::RdfXml.media_type(), "application/rdf+xml");
        Ok(())
    }
}
