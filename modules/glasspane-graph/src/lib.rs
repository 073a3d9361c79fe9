pub mod client;
pub mod migrate;
pub mod sources;
pub mod store;
pub mod uid;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
#[cfg(feature = "test-utils")]
pub mod testutil;

pub use client::GraphClient;
pub use neo4rs::query;
pub use sources::{SourcesOptions, SourcesReport, SourcesRestructurer};
pub use store::{Neo4jPersonStore, PersonStore};
pub use uid::{AssignReport, UidAssigner, DEFAULT_MAX_ATTEMPTS};
