// In-memory PersonStore for tests: no Neo4j, no Docker.
//
// Nodes keep insertion order so `list_people` mirrors store order. Counters
// record probes and writes for assertions.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use glasspane_common::{PersonRecord, SourceRecord, UidSummary};

use crate::store::PersonStore;

/// A stored `Person` node.
#[derive(Debug, Clone, Default)]
pub struct MockPerson {
    pub node_id: String,
    pub name: String,
    pub birthdate: Option<String>,
    pub uid: Option<String>,
    pub sources: Option<Vec<String>>,
    pub source: Option<String>,
    /// link index → value
    pub links: BTreeMap<u32, String>,
}

struct MockPersonStoreInner {
    people: Vec<MockPerson>,
    next_id: u32,
    /// Nodes that disappear between the read and the write.
    vanished: HashSet<String>,
    probes: Vec<String>,
    uid_writes: u32,
    source_writes: u32,
}

pub struct MockPersonStore {
    inner: Mutex<MockPersonStoreInner>,
}

impl Default for MockPersonStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPersonStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockPersonStoreInner {
                people: Vec::new(),
                next_id: 0,
                vanished: HashSet::new(),
                probes: Vec::new(),
                uid_writes: 0,
                source_writes: 0,
            }),
        }
    }

    /// Add a person; returns its node id.
    pub fn add_person(&self, name: &str, birthdate: Option<&str>, uid: Option<&str>) -> String {
        self.insert(MockPerson {
            name: name.to_string(),
            birthdate: birthdate.map(String::from),
            uid: uid.map(String::from),
            ..Default::default()
        })
    }

    /// Add a fully specified person; `node_id` is assigned by the store.
    pub fn insert(&self, mut person: MockPerson) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        person.node_id = format!("4:mock:{}", inner.next_id);
        let id = person.node_id.clone();
        inner.people.push(person);
        id
    }

    /// Delete `node_id` after the initial read: writes match nothing and it no
    /// longer counts towards the summary.
    pub fn vanish(&self, node_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .vanished
            .insert(node_id.to_string());
    }

    // --- Assertion helpers ---

    pub fn person(&self, node_id: &str) -> Option<MockPerson> {
        let inner = self.inner.lock().unwrap();
        inner.people.iter().find(|p| p.node_id == node_id).cloned()
    }

    pub fn uid_of(&self, node_id: &str) -> Option<String> {
        self.person(node_id).and_then(|p| p.uid)
    }

    pub fn probes(&self) -> Vec<String> {
        self.inner.lock().unwrap().probes.clone()
    }

    pub fn uid_writes(&self) -> u32 {
        self.inner.lock().unwrap().uid_writes
    }

    pub fn source_writes(&self) -> u32 {
        self.inner.lock().unwrap().source_writes
    }
}

fn present(inner: &MockPersonStoreInner) -> impl Iterator<Item = &MockPerson> {
    inner
        .people
        .iter()
        .filter(|p| !inner.vanished.contains(&p.node_id))
}

fn live<'a>(inner: &'a mut MockPersonStoreInner, node_id: &str) -> Option<&'a mut MockPerson> {
    if inner.vanished.contains(node_id) {
        return None;
    }
    inner.people.iter_mut().find(|p| p.node_id == node_id)
}

#[async_trait]
impl PersonStore for MockPersonStore {
    async fn list_people(&self) -> Result<Vec<PersonRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .people
            .iter()
            .map(|p| PersonRecord {
                node_id: p.node_id.clone(),
                name: p.name.clone(),
                birthdate: p.birthdate.clone(),
                uid: p.uid.clone(),
            })
            .collect())
    }

    async fn uid_in_use(&self, uid: &str) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        inner.probes.push(uid.to_string());
        let in_use = present(&inner).any(|p| p.uid.as_deref() == Some(uid));
        Ok(in_use)
    }

    async fn assign_uid(&self, node_id: &str, uid: &str) -> Result<Option<String>> {
        let mut inner = self.inner.lock().unwrap();
        let taken = present(&inner).any(|p| p.node_id != node_id && p.uid.as_deref() == Some(uid));
        if taken {
            return Ok(None);
        }
        let Some(person) = live(&mut inner, node_id) else {
            return Ok(None);
        };
        person.uid = Some(uid.to_string());
        inner.uid_writes += 1;
        Ok(Some(uid.to_string()))
    }

    async fn uid_summary(&self) -> Result<UidSummary> {
        let inner = self.inner.lock().unwrap();
        let people = present(&inner).count();
        let uids: HashSet<&str> = present(&inner).filter_map(|p| p.uid.as_deref()).collect();
        Ok(UidSummary {
            people: people as u64,
            distinct_uids: uids.len() as u64,
        })
    }

    async fn list_sources(&self, num_links: u32) -> Result<Vec<SourceRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .people
            .iter()
            .map(|p| SourceRecord {
                node_id: p.node_id.clone(),
                uid: p.uid.clone(),
                name: p.name.clone(),
                sources: p.sources.clone(),
                source: p.source.clone(),
                links: p.links.range(..num_links).map(|(_, v)| v.clone()).collect(),
            })
            .collect())
    }

    async fn write_sources(&self, node_id: &str, sources: &[String]) -> Result<Option<Vec<String>>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(person) = live(&mut inner, node_id) else {
            return Ok(None);
        };
        person.sources = Some(sources.to_vec());
        inner.source_writes += 1;
        Ok(Some(sources.to_vec()))
    }

    async fn remove_legacy_sources(&self, node_id: &str, num_links: u32) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let Some(person) = live(&mut inner, node_id) else {
            return Ok(false);
        };
        person.source = None;
        person.links.retain(|i, _| *i >= num_links);
        Ok(true)
    }
}
