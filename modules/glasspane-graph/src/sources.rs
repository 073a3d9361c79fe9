//! Fold the legacy `source` and `link0..linkN` properties on `Person` nodes
//! into a single `sources` array.

use std::fmt;

use anyhow::Result;
use tracing::{info, warn};

use crate::store::PersonStore;

#[derive(Debug, Clone, Copy)]
pub struct SourcesOptions {
    /// Rewrite people that already have a `sources` array.
    pub force: bool,
    /// How many `linkN` properties to look at.
    pub num_links: u32,
    /// Drop the legacy properties once `sources` is written.
    pub remove: bool,
}

impl Default for SourcesOptions {
    fn default() -> Self {
        Self {
            force: false,
            num_links: 20,
            remove: false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourcesReport {
    pub total: u32,
    pub rewritten: u32,
    pub skipped: u32,
    pub removed: u32,
    pub missed: u32,
}

impl fmt::Display for SourcesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read={} rewritten={} skipped={} removed={} missed={}",
            self.total, self.rewritten, self.skipped, self.removed, self.missed
        )
    }
}

pub struct SourcesRestructurer<'a, S: PersonStore + ?Sized> {
    store: &'a S,
    options: SourcesOptions,
}

impl<'a, S: PersonStore + ?Sized> SourcesRestructurer<'a, S> {
    pub fn new(store: &'a S, options: SourcesOptions) -> Self {
        Self { store, options }
    }

    pub async fn run(&self) -> Result<SourcesReport> {
        let opts = self.options;
        info!(
            force = opts.force,
            num_links = opts.num_links,
            remove = opts.remove,
            "Transforming \"source\" and \"link*\" properties into \"sources\" arrays"
        );

        let records = self.store.list_sources(opts.num_links).await?;
        let mut report = SourcesReport {
            total: records.len() as u32,
            ..Default::default()
        };

        for record in &records {
            if record.sources.is_some() && !opts.force {
                report.skipped += 1;
                continue;
            }

            let label = record.uid.as_deref().unwrap_or(record.node_id.as_str());
            info!(
                uid = label,
                name = record.name.as_str(),
                "Restructuring sources"
            );

            let merged = record.merged_sources();
            if self.store.write_sources(&record.node_id, &merged).await?.is_none() {
                report.missed += 1;
                warn!(uid = label, "sources write matched no node; skipping");
                continue;
            }
            report.rewritten += 1;

            if opts.remove {
                if self
                    .store
                    .remove_legacy_sources(&record.node_id, opts.num_links)
                    .await?
                {
                    report.removed += 1;
                } else {
                    warn!(uid = label, "legacy source removal matched no node");
                }
            }
        }

        info!("Sources restructuring complete. {report}");
        Ok(report)
    }
}
