//! Capture date resolution
//!
//! This module provides the `DateBucket` partition key (`YYYY/MM`) and the
//! `DateResolver` trait that abstracts over how the capture timestamp of a
//! photo is obtained. The production implementation shells out to exiftool
//! (`exiftool` submodule); tests substitute in-memory resolvers.

pub mod exiftool;

pub use exiftool::ExifToolResolver;

use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The `year/month` partition key a photo sorts into.
///
/// Parsed from the zero-padded `YYYY/MM` form exiftool emits for
/// `-d %Y/%m`; displays in the same form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateBucket {
    year: u16,
    month: u8,
}

impl DateBucket {
    pub fn new(year: u16, month: u8) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    /// The bucket as a two-component relative path (`YYYY` then `MM`), so
    /// the embedded separator never leaks into a single path component.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(format!("{:04}", self.year)).join(format!("{:02}", self.month))
    }
}

impl fmt::Display for DateBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}", self.year, self.month)
    }
}

impl FromStr for DateBucket {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (year, month) = s.trim().split_once('/').ok_or(())?;
        if year.len() != 4 || month.len() != 2 {
            return Err(());
        }
        let year: u16 = year.parse().map_err(|_| ())?;
        let month: u8 = month.parse().map_err(|_| ())?;
        DateBucket::new(year, month).ok_or(())
    }
}

/// Resolves the capture date of a photo into a [`DateBucket`].
///
/// `Ok(None)` means "no usable metadata" and is a recoverable per-file skip;
/// `Err` is reserved for configuration-level failures (tool missing,
/// unlaunchable, timed out) that the caller must surface distinctly.
pub trait DateResolver: Send + Sync {
    /// Preflight probe run once before a batch starts.
    fn check_available(&self) -> Result<()> {
        Ok(())
    }

    /// Resolve the `year/month` bucket for `path`.
    fn resolve(&self, path: &Path) -> Result<Option<DateBucket>>;
}
