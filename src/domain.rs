//! Normalized names, records, record sets, and signatures.

use std::collections::HashSet;

/// Lower-cases, trims whitespace, trims dots, then appends a single trailing
/// dot. Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(name: &str) -> String {
    let trimmed = name.trim().trim_matches('.').to_ascii_lowercase();
    if trimmed.is_empty() {
        return ".".to_string();
    }
    format!("{trimmed}.")
}

/// Label count of a normalized (or normalizable) name, ignoring the root.
pub(crate) fn label_count(normalized: &str) -> usize {
    let bare = normalized.trim_matches('.');
    if bare.is_empty() {
        0
    } else {
        bare.split('.').count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    A,
    Cname,
    Ns,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Cname => "CNAME",
            RecordKind::Ns => "NS",
        }
    }
}

/// A single immutable `(name, type, value)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub name: String,
    pub kind: RecordKind,
    pub value: String,
}

impl DnsRecord {
    pub fn new(name: impl Into<String>, kind: RecordKind, value: impl Into<String>) -> Self {
        DnsRecord { name: name.into(), kind, value: value.into() }
    }
}

/// An ordered sequence of records answering a single query. Order is
/// significant: the head record's type classifies the whole set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSet(pub Vec<DnsRecord>);

impl RecordSet {
    pub fn empty() -> Self {
        RecordSet(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn head_kind(&self) -> Option<RecordKind> {
        self.0.first().map(|r| r.kind)
    }

    /// The comparable signature of a record set: empty for NX, the
    /// singleton `{head.value}` for CNAME-headed sets, the union of all A
    /// values otherwise. NS occurrences never contribute.
    pub fn signature(&self) -> HashSet<String> {
        match self.head_kind() {
            None => HashSet::new(),
            Some(RecordKind::Cname) => {
                let mut set = HashSet::new();
                set.insert(self.0[0].value.clone());
                set
            }
            _ => self.0.iter().filter(|r| r.kind == RecordKind::A).map(|r| r.value.clone()).collect(),
        }
    }
}

impl From<Vec<DnsRecord>> for RecordSet {
    fn from(records: Vec<DnsRecord>) -> Self {
        RecordSet(records)
    }
}

/// A domain name paired with its resolved record set, as produced by the
/// (external) bulk resolver ingestion for each subdomain in the input
/// stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecords {
    pub domain_name: String,
    pub records: RecordSet,
}

impl DomainRecords {
    pub fn new(domain_name: impl Into<String>, records: impl Into<RecordSet>) -> Self {
        DomainRecords { domain_name: normalize(&domain_name.into()), records: records.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_idempotent() {
        for input in ["Example.COM", "  example.com.  ", "example.com", "...", ""] {
            let once = normalize(input);
            let twice = normalize(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_normalize_form() {
        assert_eq!(normalize("Example.COM"), "example.com.");
        assert_eq!(normalize("  a.b.c.  "), "a.b.c.");
        assert_eq!(normalize("a.b.c..."), "a.b.c.");
    }

    #[test]
    fn test_signature_empty() {
        assert!(RecordSet::empty().signature().is_empty());
    }

    #[test]
    fn test_signature_cname_ignores_order_and_tail() {
        let set = RecordSet(vec![
            DnsRecord::new("x.example.", RecordKind::Cname, "target.example."),
            DnsRecord::new("target.example.", RecordKind::A, "1.2.3.4"),
        ]);
        let sig = set.signature();
        assert_eq!(sig.len(), 1);
        assert!(sig.contains("target.example."));
    }

    #[test]
    fn test_signature_a_independent_of_order() {
        let forward = RecordSet(vec![
            DnsRecord::new("x.", RecordKind::A, "1.2.3.4"),
            DnsRecord::new("x.", RecordKind::A, "1.2.3.5"),
        ]);
        let backward = RecordSet(vec![
            DnsRecord::new("x.", RecordKind::A, "1.2.3.5"),
            DnsRecord::new("x.", RecordKind::A, "1.2.3.4"),
        ]);
        assert_eq!(forward.signature(), backward.signature());
    }
}
