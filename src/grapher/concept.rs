use anyhow::Result;
use graph::{Graph, Literal, dcterms, owl, rdf, skos};
use tracing::warn;

use crate::content::Catalog;
use crate::uri::build_uri;
use crate::vocab::Concept;

use super::Grapher;

impl<C: Catalog + ?Sized> Grapher<'_, C> {
    /// Adds the SKOS description of `term` in `scheme`. False when the term
    /// is not in the vocabulary.
    pub(crate) fn concept(&self, scheme: &str, term: &str, g: &mut Graph) -> bool {
        match self.vocab().resolve_concept(scheme, term) {
            Some(concept) => {
                self.concept_triples(&concept, g);
                true
            }
            None => false,
        }
    }

    pub(super) fn concept_triples(&self, concept: &Concept, g: &mut Graph) {
        let term = &concept.uri;
        g.add(term, rdf::TYPE, skos::CONCEPT);
        g.add(term, skos::PREF_LABEL, Literal::lang(&concept.title, "en"));
        if !concept.description.is_empty() {
            g.add(term, skos::SCOPE_NOTE, Literal::lang(&concept.description, "en"));
        }
        if let Some(same_as) = &concept.same_as {
            match build_uri(same_as) {
                Ok(other) => {
                    g.add(term, owl::SAME_AS, other);
                }
                Err(error) => warn!(target: "grapher", term = %term, %error, "unusable sameAs"),
            }
        }
        g.add(term, skos::IN_SCHEME, &concept.scheme);
        self.uris().alias(g, term);
    }

    /// A whole concept scheme. None when no such vocabulary exists.
    pub(crate) fn scheme(&self, name: &str) -> Result<Option<Graph>> {
        let Some(scheme) = self.cx.lookups.vocabularies.scheme(name) else {
            return Ok(None);
        };
        let mut g = Graph::with_namespaces();
        let subject = self.uris().vocabulary(name)?;
        g.add(&subject, rdf::TYPE, skos::CONCEPT_SCHEME);
        g.add(&subject, dcterms::TITLE, Literal::new(&scheme.title));
        if !scheme.description.is_empty() {
            g.add(&subject, dcterms::DESCRIPTION, Literal::new(&scheme.description));
        }
        self.uris().alias(&mut g, &subject);
        for concept in self.vocab().concepts(name) {
            self.concept_triples(&concept, &mut g);
        }
        Ok(Some(g))
    }
}
