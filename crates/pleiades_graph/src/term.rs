use std::borrow::Cow;
use std::fmt::Display;

use rio_api::model as rio;

/// An absolute IRI reference.
///
/// The value is taken as-is; minting and escaping of IRIs built from content
/// paths happens before a value gets here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Iri(Cow<'static, str>);

impl Iri {
    pub fn new(iri: impl Into<String>) -> Iri {
        Iri(Cow::Owned(iri.into()))
    }

    pub const fn const_iri(iri: &'static str) -> Iri {
        Iri(Cow::Borrowed(iri))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends `suffix` verbatim.
    pub fn join(&self, suffix: &str) -> Iri {
        Iri::new(format!("{}{}", self.0, suffix))
    }

    /// Replaces any fragment with `fragment`.
    pub fn with_fragment(&self, fragment: &str) -> Iri {
        let base = self.0.split_once('#').map_or(&*self.0, |(base, _)| base);
        Iri::new(format!("{base}#{fragment}"))
    }

    pub(crate) fn as_rio(&self) -> rio::NamedNode<'_> {
        rio::NamedNode { iri: &self.0 }
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// An existential node. Labels are unique per process, so graphs built
/// independently can be unioned without their blank nodes colliding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlankNode(String);

impl BlankNode {
    pub fn fresh() -> BlankNode {
        // RDF/XML node ids must be NCNames, hence the leading letter.
        BlankNode(format!("b{}", uuid::Uuid::now_v7().as_simple()))
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl Display for BlankNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    value: String,
    language: Option<String>,
    datatype: Option<Iri>,
}

impl Literal {
    pub fn new(value: impl Into<String>) -> Literal {
        Literal {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    /// A language tagged string. An empty tag yields a plain literal.
    pub fn lang(value: impl Into<String>, language: &str) -> Literal {
        let language = Some(language.trim())
            .filter(|l| !l.is_empty())
            .map(str::to_owned);
        Literal {
            value: value.into(),
            language,
            datatype: None,
        }
    }

    pub fn typed(value: impl Into<String>, datatype: Iri) -> Literal {
        Literal {
            value: value.into(),
            language: None,
            datatype: Some(datatype),
        }
    }

    pub fn double(value: f64) -> Literal {
        Literal::typed(format!("{value:?}"), crate::xsd::DOUBLE)
    }

    pub fn integer(value: i64) -> Literal {
        Literal::typed(value.to_string(), crate::xsd::INTEGER)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn datatype(&self) -> Option<&Iri> {
        self.datatype.as_ref()
    }

    pub(crate) fn as_rio(&self) -> rio::Literal<'_> {
        match (&self.language, &self.datatype) {
            (Some(language), _) => rio::Literal::LanguageTaggedString {
                value: &self.value,
                language,
            },
            (None, Some(datatype)) => rio::Literal::Typed {
                value: &self.value,
                datatype: datatype.as_rio(),
            },
            (None, None) => rio::Literal::Simple { value: &self.value },
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_rio().fmt(f)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::new(value)
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subject {
    Iri(Iri),
    Blank(BlankNode),
}

impl Subject {
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Subject::Iri(iri) => Some(iri),
            Subject::Blank(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Subject::Blank(_))
    }

    pub(crate) fn as_rio(&self) -> rio::Subject<'_> {
        match self {
            Subject::Iri(iri) => iri.as_rio().into(),
            Subject::Blank(node) => rio::BlankNode { id: node.id() }.into(),
        }
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::Iri(iri) => iri.fmt(f),
            Subject::Blank(node) => node.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Object {
    Iri(Iri),
    Blank(BlankNode),
    Literal(Literal),
}

impl Object {
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Object::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Object::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn as_blank(&self) -> Option<&BlankNode> {
        match self {
            Object::Blank(node) => Some(node),
            _ => None,
        }
    }

    pub(crate) fn as_rio(&self) -> rio::Term<'_> {
        match self {
            Object::Iri(iri) => iri.as_rio().into(),
            Object::Blank(node) => rio::BlankNode { id: node.id() }.into(),
            Object::Literal(literal) => literal.as_rio().into(),
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Iri(iri) => iri.fmt(f),
            Object::Blank(node) => node.fmt(f),
            Object::Literal(literal) => literal.fmt(f),
        }
    }
}

macro_rules! impl_from_for_node {
    ($node:ident) => {
        impl From<Iri> for $node {
            fn from(value: Iri) -> Self {
                $node::Iri(value)
            }
        }
        impl From<&Iri> for $node {
            fn from(value: &Iri) -> Self {
                $node::Iri(value.clone())
            }
        }
        impl From<BlankNode> for $node {
            fn from(value: BlankNode) -> Self {
                $node::Blank(value)
            }
        }
        impl From<&BlankNode> for $node {
            fn from(value: &BlankNode) -> Self {
                $node::Blank(value.clone())
            }
        }
    };
}

impl_from_for_node!(Subject);
impl_from_for_node!(Object);

impl From<Literal> for Object {
    fn from(value: Literal) -> Self {
        Object::Literal(value)
    }
}

impl From<Subject> for Object {
    fn from(value: Subject) -> Self {
        match value {
            Subject::Iri(iri) => Object::Iri(iri),
            Subject::Blank(node) => Object::Blank(node),
        }
    }
}

/// A subject-predicate-object statement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    pub subject: Subject,
    pub predicate: Iri,
    pub object: Object,
}

impl Triple {
    pub fn new(subject: impl Into<Subject>, predicate: Iri, object: impl Into<Object>) -> Triple {
        Triple {
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }
}

impl Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}
