use anyhow::Result;
use graph::{BlankNode, Graph, Iri, Literal, cito, dcterms, foaf, pleiades, prov, rdf, rdfs};
use tracing::warn;

use crate::content::{Catalog, Metadata};
use crate::uri::build_uri;
use crate::vocab::TIME_PERIODS;

use super::Grapher;

/// Identifier schemes a citation may be linked by.
const CITABLE: &[&str] = &["http://", "https://", "doi", "issn", "isbn"];

/// Who a principal turned out to be.
enum Agent {
    Known(Iri),
    Anonymous(String),
}

fn split_principals(lists: &[String]) -> Vec<String> {
    let mut result: Vec<String> = vec![];
    for principal in lists.iter().flat_map(|l| l.split(',')).map(str::trim) {
        if !principal.is_empty() && !result.iter().any(|p| p == principal) {
            result.push(principal.to_owned());
        }
    }
    result
}

/// Usable as the local part of a prefixed name.
fn is_local_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

impl<C: Catalog + ?Sized> Grapher<'_, C> {
    fn username<'p>(&'p self, principal: &'p str) -> &'p str {
        self.cx
            .site
            .user_aliases
            .get(principal)
            .map_or(principal, String::as_str)
    }

    /// Creators and contributors, with anyone credited as a contributor
    /// dropped from the creators.
    pub(super) fn principals(&self, meta: &Metadata) -> (Vec<String>, Vec<String>) {
        let mut creators = split_principals(&meta.creators);
        let contributors = split_principals(&meta.contributors);
        creators.retain(|c| {
            let username = self.username(c);
            !contributors.iter().any(|k| self.username(k) == username)
        });
        (creators, contributors)
    }

    fn agent(&self, principal: &str) -> Result<Agent> {
        if let Some(member) = self.catalog.member(self.username(principal))? {
            return Ok(Agent::Known(self.uris().author(&member.id)?));
        }
        if let Some(entry) = self.cx.lookups.authority.get(principal) {
            match (&entry.uri, &entry.username) {
                (Some(uri), _) => return Ok(Agent::Known(build_uri(uri)?)),
                (None, Some(username)) => return Ok(Agent::Known(self.uris().author(username)?)),
                (None, None) => {}
            }
        }
        Ok(Agent::Anonymous(principal.to_owned()))
    }

    fn credit(&self, g: &mut Graph, subject: &Iri, role: Iri, principal: &str) -> Result<()> {
        match self.agent(principal)? {
            Agent::Known(uri) => {
                g.add(subject, role, uri);
            }
            Agent::Anonymous(name) => {
                let person = BlankNode::fresh();
                g.add(subject, role, &person);
                g.add(&person, rdf::TYPE, foaf::PERSON);
                g.add(&person, foaf::NAME, Literal::new(name));
            }
        }
        Ok(())
    }

    /// Dublin Core description of the object at `meta.path`.
    pub(crate) fn dcterms(&self, meta: &Metadata, g: &mut Graph) -> Result<()> {
        let subject = self.uris().subject(&meta.path)?;
        g.add(&subject, dcterms::TITLE, Literal::new(&meta.title));
        g.add(&subject, dcterms::DESCRIPTION, Literal::new(&meta.description));
        if !meta.modified.is_empty() {
            g.add(&subject, dcterms::MODIFIED, Literal::new(&meta.modified));
        }
        for tag in &meta.subjects {
            g.add(&subject, dcterms::SUBJECT, Literal::new(tag));
        }
        let (creators, contributors) = self.principals(meta);
        for principal in &creators {
            self.credit(g, &subject, dcterms::CREATOR, principal)?;
        }
        for principal in &contributors {
            self.credit(g, &subject, dcterms::CONTRIBUTOR, principal)?;
        }
        Ok(())
    }

    pub(crate) fn provenance(&self, meta: &Metadata, g: &mut Graph, subject: &Iri) {
        let source = BlankNode::fresh();
        g.add(subject, prov::WAS_DERIVED_FROM, &source);
        g.add(&source, rdfs::LABEL, Literal::new(&meta.initial_provenance));
    }

    pub(crate) fn references(&self, meta: &Metadata, g: &mut Graph, subject: &Iri) {
        for citation in &meta.references {
            let identifier = citation.identifier.trim();
            if CITABLE.iter().any(|scheme| identifier.starts_with(scheme)) {
                let relation = match citation.kind.as_str() {
                    "seeAlso" => Some(cito::CITES_AS_RELATED),
                    "seeFurther" => Some(cito::CITES_FOR_INFORMATION),
                    other if is_local_name(other) => Some(cito::NS.term(other)),
                    _ => None,
                };
                match (relation, build_uri(identifier)) {
                    (Some(relation), Ok(target)) => {
                        g.add(subject, relation, target);
                    }
                    (None, _) => {
                        warn!(target: "grapher", path = %meta.path, kind = %citation.kind, "unsupported citation type");
                    }
                    (_, Err(error)) => {
                        warn!(target: "grapher", path = %meta.path, %error, "unusable citation identifier");
                    }
                }
            }
            let detail = if citation.citation_detail.is_empty() {
                &citation.range
            } else {
                &citation.citation_detail
            };
            let title = citation.short_title.trim();
            let text = if title.is_empty() {
                detail.trim().to_string()
            } else {
                format!("{title} {}", detail.trim())
            };
            g.add(subject, dcterms::BIBLIOGRAPHIC_CITATION, Literal::new(text.trim_end()));
        }
    }

    pub(crate) fn temporal(&self, meta: &Metadata, g: &mut Graph, subject: &Iri, include_vocab: bool) {
        let vocab = self.vocab();
        let periods: Vec<&str> = meta
            .attestations
            .iter()
            .map(|a| a.time_period.trim())
            .filter(|p| !p.is_empty())
            .collect();
        for &period in &periods {
            match self.uris().concept(TIME_PERIODS, period) {
                Ok(uri) => {
                    g.add(subject, pleiades::DURING, uri);
                }
                Err(error) => {
                    warn!(target: "grapher", path = %meta.path, %error, "unusable time period");
                    continue;
                }
            }
            if include_vocab && let Some(concept) = vocab.resolve_concept(TIME_PERIODS, period) {
                self.concept_triples(&concept, g);
            }
        }
        let span = meta
            .time_span
            .map(|s| (s.start, s.end))
            .or_else(|| vocab.period_span(periods.iter().copied()));
        if let Some((start, end)) = span {
            g.add(subject, pleiades::START_DATE, Literal::integer(start));
            g.add(subject, pleiades::END_DATE, Literal::integer(end));
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use graph::{Graph, Iri, Literal, cito, dcterms, foaf, pleiades, rdf};

    use crate::content::{Attestation, Citation, Metadata, TimeSpan};
    use crate::grapher::Grapher;
    use crate::grapher::fixtures::{ATHENAE, athenae, catalog, context, has, objects_of};

    use super::{is_local_name, split_principals};

    fn citation(identifier: &str, kind: &str, title: &str, detail: &str) -> Citation {
        Citation {
            identifier: identifier.to_string(),
            kind: kind.to_string(),
            short_title: title.to_string(),
            citation_detail: detail.to_string(),
            range: String::new(),
        }
    }

    #[test]
    fn principal_lists_are_split_and_trimmed() {
        let lists = vec!["a, b".to_string(), " c ,a".to_string(), String::new()];
        assert_eq!(split_principals(&lists), vec!["a", "b", "c"]);
        assert!(is_local_name("citesAsAuthority"));
        assert!(!is_local_name("cites as"));
        assert!(!is_local_name(""));
    }

    #[test]
    fn contributors_win_over_creators() -> Result<()> {
        let catalog = catalog();
        let cx = context();
        let grapher = Grapher::new(&catalog, &cx);
        let (creators, contributors) = grapher.principals(&athenae().meta);
        assert!(creators.is_empty());
        assert_eq!(contributors, vec!["S. Gillies", "thomase", "Barbara Levick"]);

        let mut g = Graph::new();
        grapher.dcterms(&athenae().meta, &mut g)?;
        let place = Iri::new(ATHENAE);
        assert!(objects_of(&g, &place, &dcterms::CREATOR).is_empty());
        assert!(has(&g, &place, dcterms::CONTRIBUTOR, Iri::new("https://pleiades.stoa.org/author/sgillies")));
        assert!(has(&g, &place, dcterms::CONTRIBUTOR, Iri::new("https://pleiades.stoa.org/author/thomase")));
        assert!(has(&g, &place, dcterms::CONTRIBUTOR, Iri::new("http://viaf.org/viaf/61554540")));
        assert!(has(&g, &place, dcterms::TITLE, Literal::new("Athenae")));
        assert!(has(&g, &place, dcterms::SUBJECT, Literal::new("dare:ancient=1")));
        Ok(())
    }

    #[test]
    fn unknown_principal_is_a_blank_person() -> Result<()> {
        let catalog = catalog();
        let cx = context();
        let grapher = Grapher::new(&catalog, &cx);
        let meta = Metadata {
            path: "/plone/places/579885".to_string(),
            creators: vec!["Unknown Scholar".to_string()],
            ..Metadata::default()
        };
        let mut g = Graph::new();
        grapher.dcterms(&meta, &mut g)?;
        let creators = objects_of(&g, &Iri::new(ATHENAE), &dcterms::CREATOR);
        assert_eq!(creators.len(), 1);
        let person = creators[0].as_blank().expect("creator should be a blank node");
        assert!(g.contains(&graph::Triple::new(person, rdf::TYPE, foaf::PERSON)));
        assert!(g.contains(&graph::Triple::new(person, foaf::NAME, Literal::new("Unknown Scholar"))));
        Ok(())
    }

    #[test]
    fn doi_citation_is_cited_as_related() {
        let catalog = catalog();
        let cx = context();
        let grapher = Grapher::new(&catalog, &cx);
        let subject = Iri::new(ATHENAE);
        let mut g = Graph::new();
        grapher.references(&athenae().meta, &mut g, &subject);
        assert!(has(&g, &subject, cito::CITES_AS_RELATED, Iri::new("doi:10.5555/batlas")));
        assert!(has(&g, &subject, dcterms::BIBLIOGRAPHIC_CITATION, Literal::new("BAtlas 59 C2 Athenae")));
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn citation_edge_cases() {
        let catalog = catalog();
        let cx = context();
        let grapher = Grapher::new(&catalog, &cx);
        let subject = Iri::new(ATHENAE);
        let mut legacy = citation("http://example.org/book", "seeFurther", "", "");
        legacy.range = "Smith 1999, 12".to_string();
        let meta = Metadata {
            references: vec![
                citation("urn:isbn:123", "seeAlso", "Local Title", ""),
                citation("https://example.org/a", "not a name", "", ""),
                citation("isbn:0691031690", "citesAsDataSource", "", "p. 4"),
                legacy,
                citation("", "seeAlso", "", ""),
            ],
            ..Metadata::default()
        };
        let mut g = Graph::new();
        grapher.references(&meta, &mut g, &subject);
        let cito_links: Vec<_> = g
            .iter()
            .filter(|t| t.predicate.as_str().starts_with(cito::NS.base))
            .collect();
        assert_eq!(cito_links.len(), 2);
        assert!(has(&g, &subject, cito::NS.term("citesAsDataSource"), Iri::new("isbn:0691031690")));
        assert!(has(&g, &subject, cito::CITES_FOR_INFORMATION, Iri::new("http://example.org/book")));
        assert!(has(&g, &subject, dcterms::BIBLIOGRAPHIC_CITATION, Literal::new("Local Title")));
        assert!(has(&g, &subject, dcterms::BIBLIOGRAPHIC_CITATION, Literal::new("p. 4")));
        assert!(has(&g, &subject, dcterms::BIBLIOGRAPHIC_CITATION, Literal::new("Smith 1999, 12")));
        // Citations without title or detail still get their (empty) literal.
        assert!(has(&g, &subject, dcterms::BIBLIOGRAPHIC_CITATION, Literal::new("")));
        assert_eq!(objects_of(&g, &subject, &dcterms::BIBLIOGRAPHIC_CITATION).len(), 4);
    }

    #[test]
    fn provenance_uses_fresh_nodes() {
        let catalog = catalog();
        let cx = context();
        let grapher = Grapher::new(&catalog, &cx);
        let subject = Iri::new(ATHENAE);
        let mut g = Graph::new();
        grapher.provenance(&athenae().meta, &mut g, &subject);
        grapher.provenance(&athenae().meta, &mut g, &subject);
        assert_eq!(g.len(), 4);
    }

    #[test]
    fn temporal_span_from_vocabulary_or_record() {
        let catalog = catalog();
        let cx = context();
        let grapher = Grapher::new(&catalog, &cx);
        let subject = Iri::new(ATHENAE);
        let mut meta = Metadata {
            attestations: vec![
                Attestation {
                    time_period: "roman".to_string(),
                    confidence: "confident".to_string(),
                },
                Attestation {
                    time_period: "classical".to_string(),
                    confidence: "probable".to_string(),
                },
            ],
            ..Metadata::default()
        };
        let mut g = Graph::new();
        grapher.temporal(&meta, &mut g, &subject, false);
        let roman = Iri::new("https://pleiades.stoa.org/vocabularies/time-periods/roman");
        assert!(has(&g, &subject, pleiades::DURING, roman.clone()));
        assert!(has(&g, &subject, pleiades::START_DATE, Literal::integer(-550)));
        assert!(has(&g, &subject, pleiades::END_DATE, Literal::integer(300)));
        assert_eq!(g.len(), 4);

        let mut with_vocab = Graph::new();
        grapher.temporal(&meta, &mut with_vocab, &subject, true);
        assert!(has(&with_vocab, &roman, graph::skos::PREF_LABEL, Literal::lang("Roman", "en")));

        meta.time_span = Some(TimeSpan { start: -100, end: 100 });
        let mut g = Graph::new();
        grapher.temporal(&meta, &mut g, &subject, false);
        assert!(has(&g, &subject, pleiades::START_DATE, Literal::integer(-100)));
        assert!(!has(&g, &subject, pleiades::START_DATE, Literal::integer(-550)));
    }
}
