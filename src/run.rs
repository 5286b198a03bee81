//! Batch copy orchestration
//!
//! Drives the per-file pipeline: classify, resolve the capture date, plan a
//! destination under each target root, copy to both. The loop runs on a
//! single background worker; the caller observes it through a channel of
//! progress events and is never blocked.

use crate::classify::is_photo;
use crate::config::Config;
use crate::date::{DateResolver, ExifToolResolver};
use crate::error::{Error, Result};
use crate::plan::plan_destination;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{Level, debug, error, info, span, warn};

/// Event published by the worker after every copy attempt and at completion.
///
/// The total counts two units per source entry, photo or not, so the
/// fraction can finish below 1.0 when entries are skipped; the final report
/// carries the skip counts that account for the shortfall.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Progress {
        completed: usize,
        total: usize,
        fraction: f64,
        percent: u8,
    },
    Done {
        report: RunReport,
    },
}

/// One recorded per-file failure.
///
/// `target_root` is the destination root the copy was bound for, or `None`
/// when the date resolution itself failed.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub source: PathBuf,
    pub target_root: Option<PathBuf>,
    pub message: String,
}

/// Outcome of one run. Attempted and succeeded copies are tracked
/// separately; a failed copy still counts as attempted.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// All top-level entries seen in the source directory
    pub total_entries: usize,
    /// Copy attempts (2 per classified, dated entry)
    pub attempted: usize,
    /// Copies that completed successfully
    pub copied: usize,
    /// Copy attempts that failed
    pub failed: usize,
    /// Entries rejected by the classifier
    pub skipped_not_photo: usize,
    /// Photos with no resolvable capture date
    pub skipped_no_date: usize,
    /// Photos whose date resolution failed outright (tool error)
    pub resolver_errors: usize,
    /// Per-failure detail for the completion summary
    pub failures: Vec<FailureRecord>,
    /// True when the run was cancelled between files
    pub cancelled: bool,
}

impl RunReport {
    pub fn summary(&self) -> String {
        format!(
            "Entries: {}, Copied: {}, Failed: {}, Skipped (not a photo): {}, Skipped (no date): {}, Resolver errors: {}",
            self.total_entries,
            self.copied,
            self.failed,
            self.skipped_not_photo,
            self.skipped_no_date,
            self.resolver_errors
        )
    }
}

/// Handle to an in-flight run: the event stream, cancellation, and join.
#[derive(Debug)]
pub struct RunHandle {
    events: Receiver<ProgressEvent>,
    cancel: Arc<AtomicBool>,
    worker: JoinHandle<RunReport>,
}

impl RunHandle {
    /// The progress event stream. Iterating it ends once the worker is done.
    pub fn events(&self) -> &Receiver<ProgressEvent> {
        &self.events
    }

    /// Request teardown; honored between files, not mid-copy.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Block until the worker finishes and return its report.
    pub fn wait(self) -> RunReport {
        self.worker.join().expect("worker thread panicked")
    }
}

/// Orchestrates one batch run at a time over a fixed configuration.
pub struct Runner {
    config: Config,
    resolver: Arc<dyn DateResolver>,
    in_flight: Arc<AtomicBool>,
}

impl Runner {
    /// Create a runner backed by the external exiftool resolver.
    pub fn new(config: Config) -> Self {
        let resolver = Arc::new(ExifToolResolver::new(
            config.exiftool_path.clone(),
            Duration::from_secs(config.exiftool_timeout_secs),
        ));
        Self::with_resolver(config, resolver)
    }

    /// Create a runner with a custom date resolver.
    pub fn with_resolver(config: Config, resolver: Arc<dyn DateResolver>) -> Self {
        Self {
            config,
            resolver,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a run on a background worker.
    ///
    /// All preconditions are checked synchronously here, before anything is
    /// mutated on disk: the three directories, exiftool availability, and a
    /// non-empty source. Only one run per runner may be in flight.
    pub fn start(&self) -> Result<RunHandle> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(Error::RunInProgress);
        }

        let entries = match self.preflight() {
            Ok(entries) => entries,
            Err(e) => {
                self.in_flight.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let (tx, rx) = channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let config = self.config.clone();
        let resolver = self.resolver.clone();
        let in_flight = self.in_flight.clone();
        let cancel_flag = cancel.clone();

        let worker = thread::spawn(move || {
            let report = run_batch(&config, resolver.as_ref(), entries, &cancel_flag, &tx);
            let _ = tx.send(ProgressEvent::Done {
                report: report.clone(),
            });
            in_flight.store(false, Ordering::SeqCst);
            report
        });

        Ok(RunHandle {
            events: rx,
            cancel,
            worker,
        })
    }

    fn preflight(&self) -> Result<Vec<PathBuf>> {
        self.config.validate()?;
        self.resolver.check_available()?;

        let entries = list_entries(&self.config.source_dir)?;
        if entries.is_empty() {
            return Err(Error::SourceEmpty {
                path: self.config.source_dir.clone(),
            });
        }
        Ok(entries)
    }
}

/// Collect the top-level entries of `dir` in listing order (non-recursive,
/// unfiltered and unsorted).
fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        entries.push(entry?.path());
    }
    Ok(entries)
}

/// The worker loop. Never panics and never lets a per-file error abort the
/// batch; every failure is recorded in the report instead.
fn run_batch(
    config: &Config,
    resolver: &dyn DateResolver,
    entries: Vec<PathBuf>,
    cancel: &AtomicBool,
    tx: &Sender<ProgressEvent>,
) -> RunReport {
    let _span = span!(Level::INFO, "batch_run").entered();

    let mut report = RunReport {
        total_entries: entries.len(),
        ..RunReport::default()
    };
    let total = entries.len() * 2;
    info!(entries = entries.len(), "Starting batch copy");

    for path in entries {
        if cancel.load(Ordering::Relaxed) {
            info!("Run cancelled, stopping before next file");
            report.cancelled = true;
            break;
        }

        if !is_photo(&path, &config.image_extensions) {
            debug!(?path, "Not a photo, skipping");
            report.skipped_not_photo += 1;
            continue;
        }

        let bucket = match resolver.resolve(&path) {
            Ok(Some(bucket)) => bucket,
            Ok(None) => {
                debug!(?path, "No capture date, skipping");
                report.skipped_no_date += 1;
                continue;
            }
            Err(e) => {
                warn!(?path, error = %e, "Date resolution failed");
                report.resolver_errors += 1;
                report.failures.push(FailureRecord {
                    source: path.clone(),
                    target_root: None,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let Some(file_name) = path.file_name().map(|n| n.to_owned()) else {
            continue;
        };

        for target_root in [&config.target_dir_1, &config.target_dir_2] {
            let outcome = plan_destination(target_root, &bucket, &file_name)
                .and_then(|dest| copy_file(&path, &dest).map(|()| dest));

            match outcome {
                Ok(dest) => {
                    info!(source = ?path, destination = ?dest, bucket = %bucket, "Copied");
                    report.copied += 1;
                }
                Err(e) => {
                    error!(source = ?path, target = ?target_root, error = %e, "Copy failed");
                    report.failed += 1;
                    report.failures.push(FailureRecord {
                        source: path.clone(),
                        target_root: Some(target_root.clone()),
                        message: e.to_string(),
                    });
                }
            }

            // One unit per copy attempt, success or not
            report.attempted += 1;
            publish_progress(tx, report.attempted, total);
        }
    }

    info!("{}", report.summary());
    report
}

fn publish_progress(tx: &Sender<ProgressEvent>, completed: usize, total: usize) {
    let fraction = if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64
    };
    let percent = (fraction * 100.0).round() as u8;
    let _ = tx.send(ProgressEvent::Progress {
        completed,
        total,
        fraction,
        percent,
    });
}

/// Copy with buffered I/O, overwriting any existing file at `dest`.
fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    let src_file = File::open(source)?;
    let dest_file = File::create(dest)?;

    let mut reader = BufReader::with_capacity(256 * 1024, src_file);
    let mut writer = BufWriter::with_capacity(256 * 1024, dest_file);

    let mut buffer = vec![0u8; 256 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
    }

    writer.flush()?;
    Ok(())
}
