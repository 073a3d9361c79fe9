use neo4rs::query;
use tracing::{info, warn};

use crate::GraphClient;

const UID_CONSTRAINT: &str =
    "CREATE CONSTRAINT person_uid IF NOT EXISTS FOR (p:Person) REQUIRE p.uid IS UNIQUE";

#[derive(Debug, PartialEq, Eq)]
enum Refusal {
    AlreadyExists,
    DuplicateUids,
    Other,
}

fn classify(msg: &str) -> Refusal {
    let msg = msg.to_lowercase();
    if msg.contains("already exists") || msg.contains("equivalent") {
        Refusal::AlreadyExists
    } else if msg.contains("both node") || msg.contains("constraintcreationfailed") {
        Refusal::DuplicateUids
    } else {
        Refusal::Other
    }
}

/// Create the `Person.uid` uniqueness constraint.
///
/// Existing duplicate uids make Neo4j refuse the constraint; that is logged
/// and ignored so a follow-up `gen-uids --overwrite` can repair the data.
pub async fn ensure_uid_constraint(client: &GraphClient) -> Result<(), neo4rs::Error> {
    let Err(e) = client.graph.run(query(UID_CONSTRAINT)).await else {
        info!("Person.uid uniqueness constraint in place");
        return Ok(());
    };

    match classify(&e.to_string()) {
        Refusal::AlreadyExists => {
            info!("Person.uid constraint already exists");
            Ok(())
        }
        Refusal::DuplicateUids => {
            warn!("Person.uid constraint not created, duplicates exist: {e}");
            Ok(())
        }
        Refusal::Other => Err(e),
    }
}
