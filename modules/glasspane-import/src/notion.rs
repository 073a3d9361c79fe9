//! Notion CSV export → Postgres.
//!
//! Expects `<data>/organizations/organizations.csv` and
//! `<data>/people/people.csv` as exported from the Notion databases. Relation
//! columns hold `Name (https://www.notion.so/...)` entries separated by `", "`.

use std::fmt;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, warn};

use glasspane_common::GlasspaneError;

/// Role given to every imported membership.
pub const MEMBER_ROLE: &str = "Mitglied";

// ---------------------------------------------------------------------------
// Parsed export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationRow {
    pub name: String,
    pub members: Vec<String>,
    pub children: Vec<String>,
    pub assoc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRow {
    pub name: String,
    pub memberships: Vec<String>,
    pub parents: Vec<String>,
    pub children: Vec<String>,
    pub partners: Vec<String>,
    pub assoc: Vec<String>,
}

impl PersonRow {
    /// `(firstname, lastname)`: everything before the last space, and the rest.
    pub fn split_name(&self) -> (&str, &str) {
        split_name(&self.name)
    }
}

#[derive(Debug, Deserialize)]
struct OrganizationCsv {
    _id: String,
    name: String,
    _kind: String,
    _subkind: String,
    _location: String,
    _parent: String,
    members: String,
    children: String,
    assoc: String,
}

#[derive(Debug, Deserialize)]
struct PersonCsv {
    _id: String,
    name: String,
    memberships: String,
    parents: String,
    children: String,
    partners: String,
    assoc: String,
}

#[derive(Debug, Default, Clone)]
pub struct NotionExport {
    pub organizations: Vec<OrganizationRow>,
    pub people: Vec<PersonRow>,
}

impl NotionExport {
    pub fn load(data_dir: &Path) -> Result<Self, GlasspaneError> {
        let orgs = data_dir.join("organizations").join("organizations.csv");
        let people = data_dir.join("people").join("people.csv");
        info!(path = %orgs.display(), "Reading organizations");
        info!(path = %people.display(), "Reading people");

        let open = |p: &Path| {
            std::fs::File::open(p)
                .map_err(|e| GlasspaneError::InvalidInput(format!("{}: {e}", p.display())))
        };
        Self::from_readers(open(&orgs)?, open(&people)?)
    }

    pub fn from_readers(organizations: impl Read, people: impl Read) -> Result<Self, GlasspaneError> {
        let organizations = read_rows::<OrganizationCsv>(organizations, 9, "organizations")?
            .into_iter()
            .map(|r| OrganizationRow {
                name: r.name.trim().to_string(),
                members: split_relations(&r.members),
                children: split_relations(&r.children),
                assoc: split_relations(&r.assoc),
            })
            .collect();

        let people = read_rows::<PersonCsv>(people, 7, "people")?
            .into_iter()
            .map(|r| PersonRow {
                name: r.name.trim().to_string(),
                memberships: split_relations(&r.memberships),
                parents: split_relations(&r.parents),
                children: split_relations(&r.children),
                partners: split_relations(&r.partners),
                assoc: split_relations(&r.assoc),
            })
            .collect();

        Ok(Self {
            organizations,
            people,
        })
    }
}

fn read_rows<T: for<'de> Deserialize<'de>>(
    reader: impl Read,
    columns: usize,
    what: &str,
) -> Result<Vec<T>, GlasspaneError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| GlasspaneError::Csv(format!("{what}: {e}")))?;
    info!(columns = ?headers.iter().collect::<Vec<_>>(), "{what} columns");

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| GlasspaneError::Csv(format!("{what}: {e}")))?;
        if record.len() != columns {
            return Err(GlasspaneError::Csv(format!(
                "{what} row {}: expected {columns} columns, found {}",
                i + 1,
                record.len()
            )));
        }
        let row = record
            .deserialize(None)
            .map_err(|e| GlasspaneError::Csv(format!("{what} row {}: {e}", i + 1)))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Split a Notion relation cell into plain names.
pub fn split_relations(cell: &str) -> Vec<String> {
    cell.split(", ")
        .map(|entry| entry.split("(https:").next().unwrap_or_default().trim())
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// `(firstname, lastname)`: everything before the last space, and the rest.
pub fn split_name(name: &str) -> (&str, &str) {
    name.rsplit_once(' ').unwrap_or((name, ""))
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NotionImportReport {
    pub organizations: u32,
    pub people: u32,
    pub memberships: u32,
    pub skipped_memberships: u32,
}

impl fmt::Display for NotionImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "organizations={} people={} memberships={} skipped_memberships={}",
            self.organizations, self.people, self.memberships, self.skipped_memberships
        )
    }
}

pub struct NotionImporter {
    pool: PgPool,
}

impl NotionImporter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the whole export in one transaction. Any database error rolls
    /// everything back.
    pub async fn run(&self, export: &NotionExport) -> Result<NotionImportReport> {
        let mut report = NotionImportReport::default();
        let mut tx = self.pool.begin().await.context("begin transaction")?;

        info!(count = export.organizations.len(), "Importing organizations");
        for org in &export.organizations {
            let oid = insert_organ(&mut tx).await?;
            sqlx::query("INSERT INTO organization (oid, name) VALUES ($1, $2)")
                .bind(oid)
                .bind(&org.name)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("insert organization {:?}", org.name))?;
            report.organizations += 1;
        }

        info!(count = export.people.len(), "Importing people");
        let mut pids: Vec<i64> = Vec::with_capacity(export.people.len());
        for person in &export.people {
            let (firstname, lastname) = person.split_name();
            if lastname.is_empty() {
                warn!(name = person.name.as_str(), "Name has no last name part");
            }
            let pid = insert_organ(&mut tx).await?;
            sqlx::query("INSERT INTO person (pid, firstname, lastname) VALUES ($1, $2, $3)")
                .bind(pid)
                .bind(firstname)
                .bind(lastname)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("insert person {:?}", person.name))?;
            pids.push(pid);
            report.people += 1;
        }

        info!(role = MEMBER_ROLE, "Creating membership role");
        let rid: i64 = sqlx::query_scalar("INSERT INTO role (name) VALUES ($1) RETURNING rid::BIGINT")
            .bind(MEMBER_ROLE)
            .fetch_one(&mut *tx)
            .await
            .context("insert role")?;

        info!("Importing memberships");
        let since: NaiveDate = DateTime::<Utc>::UNIX_EPOCH.date_naive();
        // Namesakes are separate people; pair each row with its own pid.
        for (person, &pid) in export.people.iter().zip(&pids) {
            for membership in &person.memberships {
                let oid: Option<i64> =
                    sqlx::query_scalar("SELECT oid::BIGINT FROM organization WHERE name = $1")
                        .bind(membership)
                        .fetch_optional(&mut *tx)
                        .await
                        .with_context(|| format!("look up organization {membership:?}"))?;
                let Some(oid) = oid else {
                    warn!(
                        person = person.name.as_str(),
                        organization = membership.as_str(),
                        "Unknown organization; membership skipped"
                    );
                    report.skipped_memberships += 1;
                    continue;
                };

                sqlx::query(
                    "INSERT INTO membership (organ, organization, role, since)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(pid)
                .bind(oid)
                .bind(rid)
                .bind(since)
                .execute(&mut *tx)
                .await
                .with_context(|| {
                    format!("insert membership {:?} -> {membership:?}", person.name)
                })?;
                report.memberships += 1;
            }
        }

        tx.commit().await.context("commit import")?;
        info!("Notion import complete. {report}");
        Ok(report)
    }
}

async fn insert_organ(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>) -> Result<i64> {
    let oid: i64 = sqlx::query_scalar("INSERT INTO organ DEFAULT VALUES RETURNING oid::BIGINT")
        .fetch_one(&mut **tx)
        .await
        .context("insert organ")?;
    Ok(oid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORGS: &str = "\
id,Name,Type,Subtype,Location,Parent,Members,Children,Associated
1,Green Party,party,,Berlin,,\"Alex Smith (https://www.notion.so/a1), Jo Lee (https://www.notion.so/b2)\",Green Youth (https://www.notion.so/c3),
2,Green Youth,youth,,Berlin,Green Party (https://www.notion.so/d4),,,
";

    const PEOPLE: &str = "\
id,Name,Memberships,Parents,Children,Partners,Associated
1,Alex Smith,\"Green Party (https://www.notion.so/d4), Green Youth (https://www.notion.so/c3)\",,,Jo Lee (https://www.notion.so/b2),
2,Jo Lee,,,,,
";

    #[test]
    fn split_relations_strips_notion_links() {
        assert_eq!(
            split_relations("Alex Smith (https://www.notion.so/a1), Jo Lee (https://www.notion.so/b2)"),
            vec!["Alex Smith", "Jo Lee"]
        );
    }

    #[test]
    fn split_relations_drops_blank_cells() {
        assert!(split_relations("").is_empty());
        assert!(split_relations("  ").is_empty());
    }

    #[test]
    fn split_relations_keeps_plain_names() {
        assert_eq!(split_relations("Red Cross"), vec!["Red Cross"]);
    }

    #[test]
    fn split_name_uses_last_space() {
        assert_eq!(split_name("Anna Maria Weber"), ("Anna Maria", "Weber"));
        assert_eq!(split_name("Cher"), ("Cher", ""));
    }

    #[test]
    fn parses_export() {
        let export = NotionExport::from_readers(ORGS.as_bytes(), PEOPLE.as_bytes()).unwrap();

        assert_eq!(export.organizations.len(), 2);
        assert_eq!(export.organizations[0].name, "Green Party");
        assert_eq!(export.organizations[0].members, vec!["Alex Smith", "Jo Lee"]);
        assert_eq!(export.organizations[0].children, vec!["Green Youth"]);
        assert!(export.organizations[1].members.is_empty());

        assert_eq!(export.people.len(), 2);
        let alex = &export.people[0];
        assert_eq!(alex.memberships, vec!["Green Party", "Green Youth"]);
        assert_eq!(alex.partners, vec!["Jo Lee"]);
        assert_eq!(alex.split_name(), ("Alex", "Smith"));
        assert!(export.people[1].memberships.is_empty());
    }

    #[test]
    fn wrong_column_count_is_rejected() {
        let bad_people = "id,Name\n1,Alex Smith\n";
        let err = NotionExport::from_readers(ORGS.as_bytes(), bad_people.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("expected 7 columns"));
    }
}
