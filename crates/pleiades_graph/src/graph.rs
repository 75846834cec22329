use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, AddAssign};

use crate::namespace::{self, Namespace};
use crate::{Iri, Object, Subject, Triple};

/// A set of triples plus display-only prefix bindings.
///
/// Triples are kept sorted, which makes iteration and serialization
/// independent of insertion order. Equality only considers the triples.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    triples: BTreeSet<Triple>,
    prefixes: BTreeMap<String, String>,
}

impl Graph {
    pub fn new() -> Graph {
        Graph::default()
    }

    /// A graph with every known vocabulary prefix bound.
    pub fn with_namespaces() -> Graph {
        let mut graph = Graph::new();
        for ns in namespace::ALL {
            graph.bind_namespace(ns);
        }
        graph
    }

    pub fn bind(&mut self, prefix: &str, base: &str) {
        self.prefixes.insert(prefix.to_owned(), base.to_owned());
    }

    pub fn bind_namespace(&mut self, ns: Namespace) {
        self.bind(ns.prefix, ns.base);
    }

    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, b)| (p.as_str(), b.as_str()))
    }

    /// Adds a statement. Returns false when it was already present.
    pub fn add(
        &mut self,
        subject: impl Into<Subject>,
        predicate: Iri,
        object: impl Into<Object>,
    ) -> bool {
        self.insert(Triple::new(subject, predicate, object))
    }

    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Triples matching every given component.
    /// Only the yielded triples borrow from the graph.
    pub fn matching<'a, 'q>(
        &'a self,
        subject: Option<&'q Subject>,
        predicate: Option<&'q Iri>,
        object: Option<&'q Object>,
    ) -> impl Iterator<Item = &'a Triple> {
        self.triples.iter().filter(move |t| {
            subject.is_none_or(|s| &t.subject == s)
                && predicate.is_none_or(|p| &t.predicate == p)
                && object.is_none_or(|o| &t.object == o)
        })
    }

    pub fn objects<'a, 'q>(
        &'a self,
        subject: &'q Subject,
        predicate: &'q Iri,
    ) -> impl Iterator<Item = &'a Object> {
        self.matching(Some(subject), Some(predicate), None)
            .map(|t| &t.object)
    }

    /// Unions `other` into this graph, keeping existing prefix bindings.
    pub fn merge(&mut self, other: Graph) {
        self.triples.extend(other.triples);
        for (prefix, base) in other.prefixes {
            self.prefixes.entry(prefix).or_insert(base);
        }
    }

    /// Compares triple sets with every blank node label erased.
    ///
    /// Blank nodes are existential, so two renders of the same entity never
    /// share labels. This compares the multiset of statements with blank
    /// nodes treated as indistinguishable placeholders.
    pub fn eq_modulo_blank_nodes(&self, other: &Graph) -> bool {
        self.erased() == other.erased()
    }

    fn erased(&self) -> Vec<(Option<&Iri>, &Iri, Option<&Object>)> {
        let mut erased: Vec<_> = self
            .triples
            .iter()
            .map(|t| {
                let object = match &t.object {
                    Object::Blank(_) => None,
                    object => Some(object),
                };
                (t.subject.as_iri(), &t.predicate, object)
            })
            .collect();
        erased.sort();
        erased
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.triples == other.triples
    }
}

impl Eq for Graph {}

impl Add for Graph {
    type Output = Graph;

    fn add(mut self, rhs: Graph) -> Graph {
        self.merge(rhs);
        self
    }
}

impl AddAssign for Graph {
    fn add_assign(&mut self, rhs: Graph) {
        self.merge(rhs);
    }
}

impl Extend<Triple> for Graph {
    fn extend<T: IntoIterator<Item = Triple>>(&mut self, iter: T) {
        self.triples.extend(iter);
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<T: IntoIterator<Item = Triple>>(iter: T) -> Self {
        Graph {
            triples: iter.into_iter().collect(),
            prefixes: BTreeMap::new(),
        }
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::namespace::{owl, prov, rdf, rdfs, skos};
    use crate::{BlankNode, Iri, Literal, Subject};

    use super::Graph;

    fn place() -> Iri {
        Iri::new("https://pleiades.stoa.org/places/579885")
    }

    fn sample_a() -> Graph {
        let mut g = Graph::new();
        g.add(place(), rdf::TYPE, skos::CONCEPT);
        g.add(place(), rdfs::LABEL, Literal::new("Athenae"));
        g
    }

    fn sample_b() -> Graph {
        let mut g = Graph::with_namespaces();
        g.add(place(), rdfs::LABEL, Literal::new("Athenae"));
        g.add(
            place(),
            owl::SAME_AS,
            Iri::new("http://pleiades.stoa.org/places/579885"),
        );
        g
    }

    #[test]
    fn adding_twice_is_a_noop() {
        let mut g = Graph::new();
        assert!(g.add(place(), rdf::TYPE, skos::CONCEPT));
        assert!(!g.add(place(), rdf::TYPE, skos::CONCEPT));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn union_is_commutative() {
        assert_eq!(sample_a() + sample_b(), sample_b() + sample_a());
        assert_eq!((sample_a() + sample_b()).len(), 3);
    }

    #[test]
    fn union_is_idempotent() {
        assert_eq!(sample_a() + sample_a(), sample_a());
    }

    #[test]
    fn equality_ignores_prefixes() {
        let mut bound = sample_a();
        bound.bind("skos", "http://www.w3.org/2004/02/skos/core#");
        assert_eq!(bound, sample_a());
    }

    #[test]
    fn merge_keeps_existing_bindings() {
        let mut g = Graph::new();
        g.bind("places", "https://pleiades.stoa.org/places/");
        let mut other = Graph::new();
        other.bind("places", "http://example.org/");
        other.bind("owl", "http://www.w3.org/2002/07/owl#");
        g += other;
        let prefixes: Vec<_> = g.prefixes().collect();
        assert_eq!(
            prefixes,
            vec![
                ("owl", "http://www.w3.org/2002/07/owl#"),
                ("places", "https://pleiades.stoa.org/places/"),
            ]
        );
    }

    #[test]
    fn blank_nodes_are_erased_in_comparison() {
        let build = || {
            let mut g = sample_a();
            let note = BlankNode::fresh();
            g.add(place(), prov::WAS_DERIVED_FROM, &note);
            g.add(&note, rdfs::LABEL, Literal::new("Barrington Atlas: BAtlas 59 C2"));
            g
        };
        let (first, second) = (build(), build());
        assert_ne!(first, second);
        assert!(first.eq_modulo_blank_nodes(&second));
        assert!(!first.eq_modulo_blank_nodes(&sample_a()));
    }

    #[test]
    fn objects_by_subject_and_predicate() {
        let g = sample_a() + sample_b();
        let subject = Subject::from(place());
        let labels: Vec<_> = g
            .objects(&subject, &rdfs::LABEL)
            .filter_map(|o| o.as_literal())
            .map(|l| l.value())
            .collect();
        assert_eq!(labels, vec!["Athenae"]);
    }
}
