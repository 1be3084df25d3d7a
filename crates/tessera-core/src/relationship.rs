use std::fmt;
use tessera_schema::node::{fully_qualified_name, split_fully_qualified_name};

/// URI scheme used for relationships in the JSON wire form.
pub const RELATIONSHIP_SCHEME: &str = "resource:";

///
/// Relationship
///
/// A typed pointer to another resource by identifier. Never resolved or
/// checked for existence; the target may not exist yet.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Relationship {
    namespace: String,
    type_name: String,
    id: String,
}

impl Relationship {
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        type_name: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            type_name: type_name.into(),
            id: id.into(),
        }
    }

    /// Parse `resource:org.acme.Vehicle#ABC`.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix(RELATIONSHIP_SCHEME)?;
        let (fqn, id) = rest.split_once('#')?;
        let (namespace, type_name) = split_fully_qualified_name(fqn)?;

        if id.is_empty() {
            return None;
        }

        Some(Self::new(namespace, type_name, id))
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn fully_qualified_type_name(&self) -> String {
        fully_qualified_name(&self.namespace, &self.type_name)
    }

    /// `org.acme.Vehicle#ABC`
    #[must_use]
    pub fn fully_qualified_identifier(&self) -> String {
        format!("{}#{}", self.fully_qualified_type_name(), self.id)
    }

    #[must_use]
    pub fn to_uri(&self) -> String {
        format!("{RELATIONSHIP_SCHEME}{}", self.fully_qualified_identifier())
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_form() {
        let rel = Relationship::new("org.acme", "Vehicle", "ABC");

        assert_eq!(rel.to_uri(), "resource:org.acme.Vehicle#ABC");
        assert_eq!(Relationship::from_uri(&rel.to_uri()), Some(rel));
    }

    #[test]
    fn malformed_uris_are_rejected() {
        assert_eq!(Relationship::from_uri("org.acme.Vehicle#ABC"), None);
        assert_eq!(Relationship::from_uri("resource:Vehicle#ABC"), None);
        assert_eq!(Relationship::from_uri("resource:org.acme.Vehicle#"), None);
        assert_eq!(Relationship::from_uri("resource:org.acme.Vehicle"), None);
    }
}
