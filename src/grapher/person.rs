use anyhow::Result;
use graph::{Graph, Literal, foaf, owl, rdf};
use tracing::{debug, warn};

use crate::content::Catalog;
use crate::uri::build_uri;

use super::Grapher;

impl<C: Catalog + ?Sized> Grapher<'_, C> {
    /// Every credited author, placeholder accounts aside.
    pub(crate) fn authors(&self) -> Result<Graph> {
        let mut g = Graph::with_namespaces();
        let placeholders = &self.cx.site.placeholder_users;
        for principal in self.catalog.principals()? {
            if placeholders.contains(&principal) {
                continue;
            }
            if let Err(error) = self.person(&mut g, &principal) {
                warn!(target: "grapher", %principal, %error, "author skipped");
            }
        }
        Ok(g)
    }

    /// Describes one principal. False when it resolves to nobody.
    pub(crate) fn person(&self, g: &mut Graph, principal: &str) -> Result<bool> {
        let username = self
            .cx
            .site
            .user_aliases
            .get(principal)
            .map_or(principal, String::as_str);
        let authority = &self.cx.lookups.authority;
        if let Some(member) = self.catalog.member(username)?
            && !member.fullname.is_empty()
        {
            let subject = self.uris().author(&member.id)?;
            g.add(&subject, rdf::TYPE, foaf::PERSON);
            g.add(&subject, foaf::NAME, Literal::new(&member.fullname));
            self.uris().alias(g, &subject);
            if let Some(uri) = authority.get(&member.fullname).and_then(|e| e.uri.as_deref()) {
                g.add(&subject, owl::SAME_AS, build_uri(uri)?);
            }
            return Ok(true);
        }
        let Some(entry) = authority.get(principal) else {
            debug!(target: "grapher", principal, "no member or authority entry");
            return Ok(false);
        };
        let subject = match (&entry.uri, &entry.username) {
            (Some(uri), _) => build_uri(uri)?,
            (None, Some(username)) => self.uris().author(username)?,
            (None, None) => return Ok(false),
        };
        g.add(&subject, rdf::TYPE, foaf::PERSON);
        g.add(&subject, foaf::NAME, Literal::new(principal));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use graph::{Graph, Iri, Literal, foaf, owl, rdf};

    use crate::grapher::fixtures::{catalog, context, has};
    use crate::grapher::{Entity, Grapher};

    #[test]
    fn authors_are_members_or_authorities() -> Result<()> {
        let catalog = catalog();
        let cx = context();
        let g = Grapher::new(&catalog, &cx).authors()?;
        let sean = Iri::new("https://pleiades.stoa.org/author/sgillies");
        assert!(has(&g, &sean, rdf::TYPE, foaf::PERSON));
        assert!(has(&g, &sean, foaf::NAME, Literal::new("Sean Gillies")));
        assert!(has(&g, &sean, owl::SAME_AS, Iri::new("http://viaf.org/viaf/12345")));
        assert!(has(&g, &sean, owl::SAME_AS, Iri::new("http://pleiades.stoa.org/author/sgillies")));
        let barbara = Iri::new("http://viaf.org/viaf/61554540");
        assert!(has(&g, &barbara, foaf::NAME, Literal::new("Barbara Levick")));
        assert!(!g.iter().any(|t| t.subject.to_string().contains("juser")));
        assert!(!g.iter().any(|t| t.object.to_string().contains("Unknown Scholar")));
        Ok(())
    }

    #[test]
    fn aliased_display_name_is_the_member() -> Result<()> {
        let catalog = catalog();
        let cx = context();
        let grapher = Grapher::new(&catalog, &cx);
        let mut g = Graph::new();
        assert!(grapher.person(&mut g, "T. Elliott")?);
        let tom = Iri::new("https://pleiades.stoa.org/author/thomase");
        assert!(has(&g, &tom, foaf::NAME, Literal::new("Tom Elliott")));
        assert!(!grapher.person(&mut Graph::new(), "Nobody")?);
        assert!(grapher.graph(Entity::Person("Unknown Scholar"))?.is_empty());
        Ok(())
    }
}
