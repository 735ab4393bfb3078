use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Namespace of the XBRL 2.1 instance vocabulary (`xbrli`).
pub const XBRLI_NS: &str = "http://www.xbrl.org/2003/instance";

/// Namespace of ISO 4217 currency measures (`iso4217`).
pub const ISO4217_NS: &str = "http://www.xbrl.org/2003/iso4217";

/// Qualified name of an element, variable, dimension or measure.
///
/// Identity is the expanded name (`ns_uri`, `local`); the prefix is kept for
/// display only and does not take part in equality, hashing or ordering.
#[derive(Debug, Clone)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
    pub ns_uri: Option<String>,
}

impl QName {
    pub fn new(ns_uri: Option<&str>, local: impl Into<String>) -> Self {
        Self { prefix: None, local: local.into(), ns_uri: ns_uri.map(str::to_string) }
    }

    /// Name in no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self { prefix: None, local: local.into(), ns_uri: None }
    }

    pub fn prefixed(prefix: &str, ns_uri: &str, local: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.to_string()),
            local: local.into(),
            ns_uri: Some(ns_uri.to_string()),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn ns_uri(&self) -> Option<&str> {
        self.ns_uri.as_deref()
    }

    /// Parse Clark notation (`{uri}local`) or a bare local name.
    pub fn parse_clark(s: &str) -> Self {
        if let Some((ns, local)) = s.strip_prefix('{').and_then(|rest| rest.split_once('}')) {
            let ns = if ns.is_empty() { None } else { Some(ns) };
            return QName::new(ns, local);
        }
        QName::local(s)
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.ns_uri == other.ns_uri
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ns_uri.hash(state);
        self.local.hash(state);
    }
}

impl PartialOrd for QName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ns_uri.cmp(&other.ns_uri).then_with(|| self.local.cmp(&other.local))
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.prefix, &self.ns_uri) {
            (Some(p), _) => write!(f, "{p}:{}", self.local),
            (None, Some(ns)) => write!(f, "{{{ns}}}{}", self.local),
            (None, None) => f.write_str(&self.local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn prefix_does_not_affect_identity() {
        let a = QName::prefixed("eg", "urn:example", "Assets");
        let b = QName::new(Some("urn:example"), "Assets").with_prefix("other");
        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn clark_notation_round_trips_through_display() {
        let q = QName::parse_clark("{urn:example}Liabilities");
        assert_eq!(q.ns_uri(), Some("urn:example"));
        assert_eq!(q.to_string(), "{urn:example}Liabilities");
        assert_eq!(QName::parse_clark("plain"), QName::local("plain"));
    }
}
