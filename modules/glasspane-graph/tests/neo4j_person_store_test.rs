//! Integration tests for Neo4jPersonStore, uid assignment and sources
//! restructuring against a real Neo4j.
//!
//! Requirements: Docker (for Neo4j via testcontainers)
//!
//! Run with: cargo test -p glasspane-graph --features test-utils --test neo4j_person_store_test

#![cfg(feature = "test-utils")]

use std::collections::HashSet;

use glasspane_graph::migrate::ensure_uid_constraint;
use glasspane_graph::{
    query, GraphClient, Neo4jPersonStore, PersonStore, SourcesOptions, SourcesRestructurer,
    UidAssigner,
};

async fn setup() -> (impl std::any::Any, GraphClient) {
    glasspane_graph::testutil::neo4j_container().await
}

async fn uid_for(client: &GraphClient, name: &str, birthdate: Option<&str>) -> Option<String> {
    let cypher = match birthdate {
        Some(_) => "MATCH (p:Person {name: $name}) WHERE p.birthdate = date($birthdate) RETURN p.uid AS uid",
        None => "MATCH (p:Person {name: $name}) WHERE p.birthdate IS NULL RETURN p.uid AS uid",
    };
    let q = query(cypher)
        .param("name", name)
        .param("birthdate", birthdate.unwrap_or_default());
    let mut stream = client.inner().execute(q).await.unwrap();
    let row = stream.next().await.unwrap()?;
    row.get::<String>("uid").ok()
}

async fn seed_people(client: &GraphClient) {
    client
        .inner()
        .run(query(
            "CREATE (:Person {name: 'Alex Smith', birthdate: date('1990-01-01')}),
                    (:Person {name: 'Alex Smith', birthdate: date('1985-06-15')}),
                    (:Person {name: 'Jo Lee'})",
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn assigns_distinct_uids_and_reruns_cleanly() {
    let (_container, client) = setup().await;
    seed_people(&client).await;
    ensure_uid_constraint(&client).await.unwrap();
    let store = Neo4jPersonStore::new(client.clone());

    let first = UidAssigner::new(&store).run().await.unwrap();
    assert_eq!(first.assigned, 3);
    assert_eq!((first.people, first.distinct_uids), (3, 3));

    let a = uid_for(&client, "Alex Smith", Some("1990-01-01")).await.unwrap();
    let b = uid_for(&client, "Alex Smith", Some("1985-06-15")).await.unwrap();
    let j = uid_for(&client, "Jo Lee", None).await.unwrap();
    assert_eq!([&a, &b, &j].iter().collect::<HashSet<_>>().len(), 3);

    let second = UidAssigner::new(&store).run().await.unwrap();
    assert_eq!(second.assigned, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(uid_for(&client, "Jo Lee", None).await.unwrap(), j);
}

#[tokio::test]
async fn conditional_write_refuses_a_uid_held_elsewhere() {
    let (_container, client) = setup().await;
    seed_people(&client).await;
    let store = Neo4jPersonStore::new(client.clone());

    let people = store.list_people().await.unwrap();
    assert_eq!(people.len(), 3);

    let written = store.assign_uid(&people[0].node_id, "shared").await.unwrap();
    assert_eq!(written.as_deref(), Some("shared"));
    assert!(store.uid_in_use("shared").await.unwrap());

    let refused = store.assign_uid(&people[1].node_id, "shared").await.unwrap();
    assert_eq!(refused, None);

    let summary = store.uid_summary().await.unwrap();
    assert_eq!(summary.people, 3);
    assert_eq!(summary.distinct_uids, 1);
}

#[tokio::test]
async fn sources_are_restructured_and_legacy_removed() {
    let (_container, client) = setup().await;
    client
        .inner()
        .run(query(
            "CREATE (:Person {uid: 'u1', name: 'Jo Lee', source: 'Interview',
                              link0: 'https://a.example', link2: 'https://c.example'})",
        ))
        .await
        .unwrap();
    let store = Neo4jPersonStore::new(client.clone());

    let opts = SourcesOptions {
        num_links: 5,
        remove: true,
        ..Default::default()
    };
    let report = SourcesRestructurer::new(&store, opts).run().await.unwrap();
    assert_eq!(report.rewritten, 1);
    assert_eq!(report.removed, 1);

    let records = store.list_sources(5).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].sources,
        Some(vec![
            "https://a.example".to_string(),
            "https://c.example".to_string(),
            "Interview".to_string(),
        ])
    );
    assert_eq!(records[0].source, None);
    assert!(records[0].links.is_empty());
}
