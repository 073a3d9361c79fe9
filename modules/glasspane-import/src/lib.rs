pub mod csv_insert;
pub mod db;
pub mod notion;

pub use csv_insert::{render_insert, render_insert_file};
pub use db::connect;
pub use notion::{NotionExport, NotionImportReport, NotionImporter};
