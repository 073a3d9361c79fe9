// PersonStore: every graph read and write the maintenance procedures need.
//
// The Neo4j implementation matches nodes by `elementId`, captured when the
// node is first read, never by name/birthdate. MockPersonStore (testing.rs)
// implements the same trait in memory.

use anyhow::Result;
use async_trait::async_trait;
use neo4rs::query;
use tracing::debug;

use glasspane_common::{PersonRecord, SourceRecord, UidSummary};

use crate::GraphClient;

#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Every `Person` node, in store order.
    async fn list_people(&self) -> Result<Vec<PersonRecord>>;

    /// Collision probe: does any `Person` already hold `uid`?
    async fn uid_in_use(&self, uid: &str) -> Result<bool>;

    /// Set `uid` on the node, unless another `Person` holds it already.
    /// Returns the persisted uid, or `None` when nothing was written.
    async fn assign_uid(&self, node_id: &str, uid: &str) -> Result<Option<String>>;

    /// Count distinct people and distinct non-null uids.
    async fn uid_summary(&self) -> Result<UidSummary>;

    /// Every `Person` node with its current and legacy source properties.
    async fn list_sources(&self, num_links: u32) -> Result<Vec<SourceRecord>>;

    /// Overwrite the `sources` array. Returns the stored array, or `None` if
    /// the node no longer exists.
    async fn write_sources(&self, node_id: &str, sources: &[String]) -> Result<Option<Vec<String>>>;

    /// Drop `source` and `link0..link{num_links-1}`. Returns `false` if the
    /// node no longer exists.
    async fn remove_legacy_sources(&self, node_id: &str, num_links: u32) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// Neo4jPersonStore
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Neo4jPersonStore {
    client: GraphClient,
}

impl Neo4jPersonStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PersonStore for Neo4jPersonStore {
    async fn list_people(&self) -> Result<Vec<PersonRecord>> {
        let q = query(
            "MATCH (p:Person)
             RETURN elementId(p) AS node_id,
                    coalesce(p.name, '') AS name,
                    coalesce(toString(p.birthdate), '') AS birthdate,
                    coalesce(p.uid, '') AS uid",
        );

        let mut stream = self.client.graph.execute(q).await?;
        let mut people = Vec::new();
        while let Some(row) = stream.next().await? {
            let birthdate: String = row.get("birthdate").unwrap_or_default();
            let uid: String = row.get("uid").unwrap_or_default();
            people.push(PersonRecord {
                node_id: row.get("node_id")?,
                name: row.get("name").unwrap_or_default(),
                birthdate: non_empty(birthdate),
                uid: non_empty(uid),
            });
        }

        debug!(count = people.len(), "Loaded people");
        Ok(people)
    }

    async fn uid_in_use(&self, uid: &str) -> Result<bool> {
        let q = query("MATCH (p:Person {uid: $uid}) RETURN count(p) AS n").param("uid", uid);

        let mut stream = self.client.graph.execute(q).await?;
        let n: i64 = match stream.next().await? {
            Some(row) => row.get("n")?,
            None => 0,
        };
        Ok(n > 0)
    }

    async fn assign_uid(&self, node_id: &str, uid: &str) -> Result<Option<String>> {
        // Probe and write in one statement so a uid taken after the probe
        // is never assigned twice.
        let q = query(
            "MATCH (p:Person) WHERE elementId(p) = $node_id
             AND NOT EXISTS {
                 MATCH (other:Person {uid: $uid}) WHERE other <> p
             }
             SET p.uid = $uid
             RETURN p.uid AS uid",
        )
        .param("node_id", node_id)
        .param("uid", uid);

        let mut stream = self.client.graph.execute(q).await?;
        match stream.next().await? {
            Some(row) => Ok(Some(row.get("uid")?)),
            None => Ok(None),
        }
    }

    async fn uid_summary(&self) -> Result<UidSummary> {
        let q = query(
            "MATCH (p:Person)
             RETURN count(DISTINCT p) AS people, count(DISTINCT p.uid) AS uids",
        );

        let mut stream = self.client.graph.execute(q).await?;
        let Some(row) = stream.next().await? else {
            return Ok(UidSummary::default());
        };
        let people: i64 = row.get("people")?;
        let uids: i64 = row.get("uids")?;
        Ok(UidSummary {
            people: people.max(0) as u64,
            distinct_uids: uids.max(0) as u64,
        })
    }

    async fn list_sources(&self, num_links: u32) -> Result<Vec<SourceRecord>> {
        let q = query(
            "MATCH (p:Person)
             WITH p, [i IN range(0, $num_links - 1) | p['link' + toString(i)]] AS raw_links
             RETURN elementId(p) AS node_id,
                    coalesce(p.uid, '') AS uid,
                    coalesce(p.name, '') AS name,
                    p.sources IS NOT NULL AS has_sources,
                    [s IN coalesce(p.sources, []) | toString(s)] AS sources,
                    coalesce(toString(p.source), '') AS source,
                    [l IN raw_links WHERE l IS NOT NULL | toString(l)] AS links",
        )
        .param("num_links", i64::from(num_links));

        let mut stream = self.client.graph.execute(q).await?;
        let mut records = Vec::new();
        while let Some(row) = stream.next().await? {
            let has_sources: bool = row.get("has_sources").unwrap_or(false);
            let sources: Vec<String> = row.get("sources").unwrap_or_default();
            let uid: String = row.get("uid").unwrap_or_default();
            let source: String = row.get("source").unwrap_or_default();
            records.push(SourceRecord {
                node_id: row.get("node_id")?,
                uid: non_empty(uid),
                name: row.get("name").unwrap_or_default(),
                sources: has_sources.then_some(sources),
                source: non_empty(source),
                links: row.get("links").unwrap_or_default(),
            });
        }

        debug!(count = records.len(), num_links, "Loaded source records");
        Ok(records)
    }

    async fn write_sources(&self, node_id: &str, sources: &[String]) -> Result<Option<Vec<String>>> {
        let q = query(
            "MATCH (p:Person) WHERE elementId(p) = $node_id
             SET p.sources = $sources
             RETURN p.sources AS sources",
        )
        .param("node_id", node_id)
        .param("sources", sources.to_vec());

        let mut stream = self.client.graph.execute(q).await?;
        match stream.next().await? {
            Some(row) => Ok(Some(row.get("sources").unwrap_or_default())),
            None => Ok(None),
        }
    }

    async fn remove_legacy_sources(&self, node_id: &str, num_links: u32) -> Result<bool> {
        let cypher = format!(
            "MATCH (p:Person) WHERE elementId(p) = $node_id
             REMOVE {}
             RETURN elementId(p) AS node_id",
            legacy_properties(num_links).join(", ")
        );
        let q = query(&cypher).param("node_id", node_id);

        let mut stream = self.client.graph.execute(q).await?;
        Ok(stream.next().await?.is_some())
    }
}

/// `p.source, p.link0, ..., p.link{num_links-1}`.
fn legacy_properties(num_links: u32) -> Vec<String> {
    std::iter::once("p.source".to_string())
        .chain((0..num_links).map(|i| format!("p.link{i}")))
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_properties_lists_source_then_links() {
        assert_eq!(
            legacy_properties(3),
            vec!["p.source", "p.link0", "p.link1", "p.link2"]
        );
    }

    #[test]
    fn legacy_properties_without_links() {
        assert_eq!(legacy_properties(0), vec!["p.source"]);
    }
}
