pub mod export;

pub use export::{finalize, ExportSummary};
