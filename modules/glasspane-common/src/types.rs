// ---------------------------------------------------------------------------
// Person nodes
// ---------------------------------------------------------------------------

/// A `Person` node as read for uid assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    /// Store-intrinsic node identity (Neo4j `elementId`), captured at read time.
    pub node_id: String,
    pub name: String,
    /// Rendered as a string; only used for display.
    pub birthdate: Option<String>,
    pub uid: Option<String>,
}

impl PersonRecord {
    pub fn has_uid(&self) -> bool {
        self.uid.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// A `Person` node as read for sources restructuring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub node_id: String,
    pub uid: Option<String>,
    pub name: String,
    /// The `sources` array, `None` when the property is absent.
    pub sources: Option<Vec<String>>,
    /// Legacy single `source` property.
    pub source: Option<String>,
    /// Non-null values of `link0..linkN`, in index order.
    pub links: Vec<String>,
}

impl SourceRecord {
    /// Legacy links followed by the legacy `source`, if any.
    pub fn merged_sources(&self) -> Vec<String> {
        self.links
            .iter()
            .cloned()
            .chain(self.source.clone())
            .collect()
    }
}

/// Store-wide uid counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UidSummary {
    /// Distinct `Person` nodes.
    pub people: u64,
    /// Distinct non-null `uid` values.
    pub distinct_uids: u64,
}

impl UidSummary {
    pub fn is_consistent(&self) -> bool {
        self.people == self.distinct_uids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: Option<&str>, links: &[&str]) -> SourceRecord {
        SourceRecord {
            node_id: "4:abc:1".into(),
            uid: Some("u1".into()),
            name: "Jo Lee".into(),
            sources: None,
            source: source.map(String::from),
            links: links.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn merged_sources_puts_links_before_source() {
        let r = record(Some("book p. 12"), &["https://a", "https://b"]);
        assert_eq!(r.merged_sources(), vec!["https://a", "https://b", "book p. 12"]);
    }

    #[test]
    fn merged_sources_keeps_links_without_source() {
        let r = record(None, &["https://a"]);
        assert_eq!(r.merged_sources(), vec!["https://a"]);
    }

    #[test]
    fn empty_uid_counts_as_missing() {
        let mut p = PersonRecord {
            node_id: "4:abc:2".into(),
            name: "Alex Smith".into(),
            birthdate: None,
            uid: Some(String::new()),
        };
        assert!(!p.has_uid());
        p.uid = Some("0f".into());
        assert!(p.has_uid());
    }

    #[test]
    fn summary_is_consistent_only_when_every_person_has_a_distinct_uid() {
        let mut s = UidSummary {
            people: 3,
            distinct_uids: 3,
        };
        assert!(s.is_consistent());
        s.distinct_uids = 2;
        assert!(!s.is_consistent());
        assert!(UidSummary::default().is_consistent());
    }
}
