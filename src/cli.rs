//! CLI argument parsing with clap

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Photo Importer - sorts photos into year/month folders under two targets
///
/// Scans the top-level entries of a source directory, classifies images,
/// resolves each capture date through exiftool and copies every dated photo
/// to YYYY/MM/ under both target roots.
#[derive(Parser, Debug)]
#[command(name = "photo-importer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Source directory to scan for photos (top level only)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// First target root for sorted copies
    #[arg(short = '1', long = "target1")]
    pub target_1: Option<PathBuf>,

    /// Second target root for sorted copies
    #[arg(short = '2', long = "target2")]
    pub target_2: Option<PathBuf>,

    /// Path to the exiftool executable
    #[arg(long, env = "PHOTO_IMPORTER_EXIFTOOL")]
    pub exiftool: Option<PathBuf>,

    /// Upper bound in seconds for one exiftool invocation
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub print_sample_config: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Get config file name (without extension) for log naming
    pub fn config_name(&self) -> Option<String> {
        self.config.as_ref().and_then(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
    }

    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref source) = self.source {
            config.source_dir = source.clone();
        }
        if let Some(ref target) = self.target_1 {
            config.target_dir_1 = target.clone();
        }
        if let Some(ref target) = self.target_2 {
            config.target_dir_2 = target.clone();
        }
        if let Some(ref exiftool) = self.exiftool {
            config.exiftool_path = exiftool.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.exiftool_timeout_secs = timeout_secs;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config_file_settings() {
        let cli = Cli::try_parse_from([
            "photo-importer",
            "--source",
            "/cli/source",
            "--timeout-secs",
            "7",
        ])
        .unwrap();

        let mut file_config = Config::default();
        file_config.source_dir = PathBuf::from("/file/source");
        file_config.target_dir_1 = PathBuf::from("/file/target1");

        let merged = cli.merge_with_config(file_config);
        assert_eq!(merged.source_dir, PathBuf::from("/cli/source"));
        assert_eq!(merged.target_dir_1, PathBuf::from("/file/target1"));
        assert_eq!(merged.exiftool_timeout_secs, 7);
    }

    #[test]
    fn test_to_config_uses_defaults() {
        let cli = Cli::try_parse_from(["photo-importer"]).unwrap();
        let config = cli.to_config();
        assert!(config.source_dir.as_os_str().is_empty());
        assert_eq!(config.exiftool_timeout_secs, 30);
    }
}
