//! Unique uid assignment for `Person` nodes.
//!
//! Each person without a uid (or every person, in overwrite mode) gets a
//! fresh 128-bit random id rendered as 32 lowercase hex characters. Candidates
//! are probed against the store and resampled on collision; the probe loop is
//! bounded so a misbehaving store can't hang the run.

use std::fmt;

use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;

use glasspane_common::{GlasspaneError, UidSummary};

use crate::store::PersonStore;

/// Probe attempts per person before the run is aborted.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1_000;

type Minter = Box<dyn FnMut() -> String + Send>;

/// Counters for a single assignment run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssignReport {
    /// People returned by the initial read.
    pub total: u32,
    /// People that received a new uid.
    pub assigned: u32,
    /// People left alone because they already had a uid.
    pub skipped: u32,
    /// Writes that matched no node.
    pub missed: u32,
    /// Distinct people in the store after the run.
    pub people: u64,
    /// Distinct non-null uids in the store after the run.
    pub distinct_uids: u64,
}

impl AssignReport {
    pub fn summary(&self) -> UidSummary {
        UidSummary {
            people: self.people,
            distinct_uids: self.distinct_uids,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.summary().is_consistent()
    }
}

impl fmt::Display for AssignReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "people={} distinct_uids={} (read={} assigned={} skipped={} missed={})",
            self.people, self.distinct_uids, self.total, self.assigned, self.skipped, self.missed
        )
    }
}

/// Generate a uid: UUIDv4 as 32 lowercase hex characters.
pub fn new_uid() -> String {
    Uuid::new_v4().simple().to_string()
}

pub struct UidAssigner<'a, S: PersonStore + ?Sized> {
    store: &'a S,
    overwrite: bool,
    max_attempts: u32,
    mint: Minter,
}

impl<'a, S: PersonStore + ?Sized> UidAssigner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            overwrite: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            mint: Box::new(new_uid),
        }
    }

    /// Regenerate uids for people that already have one.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Replace the uid generator.
    pub fn with_minter(mut self, mint: impl FnMut() -> String + Send + 'static) -> Self {
        self.mint = Box::new(mint);
        self
    }

    pub async fn run(mut self) -> Result<AssignReport> {
        let people = self.store.list_people().await?;
        let mut report = AssignReport {
            total: people.len() as u32,
            ..Default::default()
        };

        info!(
            people = people.len(),
            overwrite = self.overwrite,
            "Assigning uids"
        );

        for person in &people {
            if person.has_uid() && !self.overwrite {
                report.skipped += 1;
                continue;
            }

            let candidate = self.unused_uid().await?;
            match self.store.assign_uid(&person.node_id, &candidate).await? {
                Some(uid) => {
                    report.assigned += 1;
                    info!(
                        uid = uid.as_str(),
                        name = person.name.as_str(),
                        birthdate = person.birthdate.as_deref().unwrap_or("-"),
                        "Assigned uid"
                    );
                }
                None => {
                    report.missed += 1;
                    warn!(
                        node_id = person.node_id.as_str(),
                        name = person.name.as_str(),
                        "uid write matched no node; skipping"
                    );
                }
            }
        }

        let summary = self.store.uid_summary().await?;
        report.people = summary.people;
        report.distinct_uids = summary.distinct_uids;

        if report.is_consistent() {
            info!("uid assignment complete. {report}");
        } else {
            warn!("uid counts diverge after assignment. {report}");
        }

        Ok(report)
    }

    /// Sample candidates until one is not held by any person.
    async fn unused_uid(&mut self) -> Result<String> {
        for attempt in 1..=self.max_attempts {
            let candidate = (self.mint)();
            if !self.store.uid_in_use(&candidate).await? {
                return Ok(candidate);
            }
            warn!(attempt, uid = candidate.as_str(), "uid collision, resampling");
        }
        Err(GlasspaneError::UidExhausted {
            attempts: self.max_attempts,
        }
        .into())
    }
}
