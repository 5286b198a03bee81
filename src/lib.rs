//! Photo Importer - batch photo sorting into year/month folders
//!
//! This library implements the import pipeline behind the CLI:
//! - Extension and MIME based photo classification
//! - Capture date resolution via an external exiftool subprocess
//! - Year/month destination planning under two target roots
//! - A single-worker batch copier that reports progress over a channel

pub mod classify;
pub mod cli;
pub mod config;
pub mod date;
pub mod error;
pub mod plan;
pub mod run;

pub use cli::Cli;
pub use config::Config;
pub use date::{DateBucket, DateResolver, ExifToolResolver};
pub use error::{Error, Result};
pub use run::{ProgressEvent, RunHandle, RunReport, Runner};
