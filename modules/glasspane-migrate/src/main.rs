use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use glasspane_common::{load_env_file, Neo4jConfig, PgConfig};
use glasspane_graph::{
    migrate::ensure_uid_constraint, GraphClient, Neo4jPersonStore, SourcesOptions,
    SourcesRestructurer, UidAssigner, DEFAULT_MAX_ATTEMPTS,
};
use glasspane_import::{connect, render_insert_file, NotionExport, NotionImporter};

#[derive(Parser, Debug)]
#[command(name = "glasspane-migrate", about = "One-shot data imports and graph cleanups")]
struct Cli {
    /// `.env` file to load before reading configuration
    #[arg(long, global = true, env = "GLASSPANE_ENV_FILE")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Give every Person node a unique uid
    GenUids {
        /// Regenerate uids for people that already have one
        #[arg(long)]
        overwrite: bool,

        /// Collision probes per person before giving up
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_attempts: u32,

        /// Create the Person.uid uniqueness constraint after assigning
        #[arg(long)]
        ensure_constraint: bool,
    },

    /// Fold legacy `source` and `linkN` properties into a `sources` array
    SourcesArray {
        /// Rewrite people that already have `sources`
        #[arg(long)]
        force: bool,

        /// Number of `linkN` properties to read
        #[arg(long, default_value_t = 20)]
        num_links: u32,

        /// Remove the legacy properties afterwards
        #[arg(long)]
        remove: bool,
    },

    /// Print a CSV file as an INSERT statement
    CsvToInsert {
        /// CSV file to convert
        csv_file: PathBuf,

        /// Table to insert into
        table: String,
    },

    /// Import a Notion CSV export into Postgres
    NotionImport {
        /// Directory holding `organizations/` and `people/`
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("glasspane=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    load_env_file(cli.env_file.as_deref())?;

    match cli.command {
        Command::GenUids {
            overwrite,
            max_attempts,
            ensure_constraint,
        } => {
            let client = connect_graph().await?;
            let store = Neo4jPersonStore::new(client.clone());

            let report = UidAssigner::new(&store)
                .overwrite(overwrite)
                .max_attempts(max_attempts)
                .run()
                .await?;

            println!("People: {}  |  Distinct uids: {}", report.people, report.distinct_uids);
            if !report.is_consistent() {
                warn!("Counts differ: some people share a uid or were not updated");
            }

            if ensure_constraint {
                ensure_uid_constraint(&client).await?;
            }
        }
        Command::SourcesArray {
            force,
            num_links,
            remove,
        } => {
            let client = connect_graph().await?;
            let store = Neo4jPersonStore::new(client);
            let options = SourcesOptions {
                force,
                num_links,
                remove,
            };

            let report = SourcesRestructurer::new(&store, options).run().await?;
            println!("Sources: {report}");
        }
        Command::CsvToInsert { csv_file, table } => {
            warn!("Values are not sanitised; review the statement before running it");
            let sql = render_insert_file(&csv_file, &table)?;
            println!("{sql}");
        }
        Command::NotionImport { data_dir } => {
            info!(data_dir = %data_dir.display(), "Notion import starting");
            warn!("Values are inserted as exported; nothing is deduplicated");

            let export = NotionExport::load(&data_dir)?;
            let config = PgConfig::from_env()?;
            config.log_redacted();
            let pool = connect(&config).await?;

            let report = NotionImporter::new(pool).run(&export).await?;
            println!("Imported: {report}");
        }
    }

    Ok(())
}

async fn connect_graph() -> Result<GraphClient> {
    let config = Neo4jConfig::from_env()?;
    config.log_redacted();
    info!(uri = config.uri.as_str(), "Connecting to Neo4j");
    Ok(GraphClient::connect(&config).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gen_uids_defaults() {
        let cli = Cli::try_parse_from(["glasspane-migrate", "gen-uids"]).unwrap();
        match cli.command {
            Command::GenUids {
                overwrite,
                max_attempts,
                ensure_constraint,
            } => {
                assert!(!overwrite);
                assert_eq!(max_attempts, DEFAULT_MAX_ATTEMPTS);
                assert!(!ensure_constraint);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn sources_array_flags() {
        let cli = Cli::try_parse_from([
            "glasspane-migrate",
            "sources-array",
            "--force",
            "--num-links",
            "5",
            "--remove",
        ])
        .unwrap();
        match cli.command {
            Command::SourcesArray {
                force,
                num_links,
                remove,
            } => assert!(force && remove && num_links == 5),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn csv_to_insert_needs_file_and_table() {
        assert!(Cli::try_parse_from(["glasspane-migrate", "csv-to-insert", "people.csv"]).is_err());

        let cli = Cli::try_parse_from([
            "glasspane-migrate",
            "--env-file",
            "core/.env",
            "csv-to-insert",
            "people.csv",
            "person",
        ])
        .unwrap();
        assert_eq!(cli.env_file, Some(PathBuf::from("core/.env")));
        assert!(matches!(cli.command, Command::CsvToInsert { ref table, .. } if table == "person"));
    }
}
