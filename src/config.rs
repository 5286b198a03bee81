//! Configuration types for the photo importer

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default location the original tool shipped with; overridable via config,
/// CLI flag or environment.
pub const DEFAULT_EXIFTOOL: &str = "exiftool";

/// Default bound on a single exiftool invocation.
pub const DEFAULT_EXIFTOOL_TIMEOUT_SECS: u64 = 30;

/// Configuration for one import run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source directory whose top-level entries are scanned
    pub source_dir: PathBuf,

    /// First target root for sorted copies
    pub target_dir_1: PathBuf,

    /// Second target root for sorted copies
    pub target_dir_2: PathBuf,

    /// Path to the exiftool executable
    #[serde(default = "default_exiftool")]
    pub exiftool_path: PathBuf,

    /// Upper bound in seconds for one exiftool invocation
    #[serde(default = "default_timeout_secs")]
    pub exiftool_timeout_secs: u64,

    /// Filename extensions accepted without a MIME probe (lowercase)
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Verbose output
    #[serde(default)]
    pub verbose: bool,
}

fn default_exiftool() -> PathBuf {
    PathBuf::from(DEFAULT_EXIFTOOL)
}

fn default_timeout_secs() -> u64 {
    DEFAULT_EXIFTOOL_TIMEOUT_SECS
}

fn default_image_extensions() -> Vec<String> {
    [
        "jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "heic", "cr2", "cr3", "nef", "arw",
        "dng", "orf", "rw2", "raf", "srw", "pef",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            target_dir_1: PathBuf::new(),
            target_dir_2: PathBuf::new(),
            exiftool_path: default_exiftool(),
            exiftool_timeout_secs: default_timeout_secs(),
            image_extensions: default_image_extensions(),
            verbose: false,
        }
    }
}

impl Config {
    /// Check that all three directories are set and exist before a run.
    ///
    /// Performs no filesystem mutations; a violation here means the run
    /// never starts.
    pub fn validate(&self) -> Result<()> {
        for (role, dir) in [
            ("source", &self.source_dir),
            ("target 1", &self.target_dir_1),
            ("target 2", &self.target_dir_2),
        ] {
            if dir.as_os_str().is_empty() {
                return Err(Error::DirectoryNotSet { role });
            }
            if !dir.is_dir() {
                return Err(Error::DirectoryMissing {
                    role,
                    path: dir.clone(),
                });
            }
        }

        // The original imposes no nesting restriction, so this stays a warning.
        for target in [&self.target_dir_1, &self.target_dir_2] {
            if target.starts_with(&self.source_dir) {
                warn!(
                    target_dir = %target.display(),
                    source_dir = %self.source_dir.display(),
                    "Target directory lies inside the source directory"
                );
            }
        }

        Ok(())
    }

    /// Check if a file extension is in the accepted image list
    pub fn is_image_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.image_extensions.iter().any(|e| e == &ext_lower)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config file '{}': {}", path.display(), e))
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)?;
        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# Photo Importer Configuration File
# This file uses TOML format (https://toml.io)

# Source directory whose top-level entries are scanned for photos
source_dir = "/media/card/DCIM"

# The two target roots; every photo is copied under both as YYYY/MM/filename
target_dir_1 = "/mnt/nas/photos"
target_dir_2 = "/mnt/backup/photos"

# Path to the exiftool executable ("exiftool" resolves via PATH)
exiftool_path = "/usr/local/bin/exiftool"

# Upper bound in seconds for one exiftool invocation
exiftool_timeout_secs = 30

# Extensions accepted without a MIME probe; anything else is accepted
# only if its guessed MIME type is image/*
image_extensions = ["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "heic", "cr2", "cr3", "nef", "arw", "dng", "orf", "rw2", "raf", "srw", "pef"]

# Verbose output
verbose = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_extensions() {
        let config = Config::default();
        assert!(config.is_image_extension("jpg"));
        assert!(config.is_image_extension("JPG"));
        assert!(config.is_image_extension("cr3"));
        assert!(!config.is_image_extension("txt"));
    }

    #[test]
    fn test_validate_rejects_unset_directories() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::DirectoryNotSet { role: "source" }));
        assert!(err.is_precondition());
    }

    #[test]
    fn test_validate_rejects_missing_directory() {
        let source = tempfile::tempdir().unwrap();
        let config = Config {
            source_dir: source.path().to_path_buf(),
            target_dir_1: PathBuf::from("/definitely/not/a/real/dir"),
            target_dir_2: source.path().to_path_buf(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::DirectoryMissing { role: "target 1", .. }));
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("importer.toml");

        let mut config = Config::default();
        config.source_dir = PathBuf::from("/photos/in");
        config.exiftool_timeout_secs = 5;
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.source_dir, config.source_dir);
        assert_eq!(loaded.exiftool_timeout_secs, 5);
        assert_eq!(loaded.image_extensions, config.image_extensions);
    }

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::sample_config()).unwrap();
        assert_eq!(config.exiftool_timeout_secs, 30);
        assert!(config.is_image_extension("nef"));
    }
}
