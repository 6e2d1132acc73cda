//! Configuration, secret resolution and the ingestion driver.

pub mod bootstrap;
pub mod config;
pub mod driver;
pub mod error;
pub mod vault;

pub use driver::{IngestReport, IngestState, IngestionDriver};
pub use error::IngestError;
