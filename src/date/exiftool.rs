//! Capture date extraction via the external exiftool executable

use crate::date::{DateBucket, DateResolver};
use crate::error::{Error, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Output label exiftool prints for the original capture timestamp
const DATE_TIME_ORIGINAL_LABEL: &str = "Date/Time Original";

/// Poll interval while waiting for the subprocess to exit
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Resolves capture dates by invoking
/// `<exiftool> -DateTimeOriginal -d %Y/%m <file>` per photo.
///
/// Success is inferred from the presence of a `Date/Time Original: <value>`
/// line in the merged output, never from the exit code.
pub struct ExifToolResolver {
    exe: PathBuf,
    timeout: Duration,
}

impl ExifToolResolver {
    pub fn new(exe: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            exe: exe.into(),
            timeout,
        }
    }

    /// Run exiftool for `path` and return its merged stdout+stderr.
    ///
    /// The child is always reaped; a child still running at the deadline is
    /// killed and reported as a timeout.
    fn run_exiftool(&self, path: &Path) -> Result<String> {
        let mut child = Command::new(&self.exe)
            .args(["-DateTimeOriginal", "-d", "%Y/%m"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::ExifToolNotFound {
                    path: self.exe.clone(),
                },
                _ => Error::ExifToolLaunch {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                },
            })?;

        // Drain both pipes off-thread so a chatty child can never block on a
        // full pipe while we wait for it.
        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        self.wait_with_deadline(&mut child, path)?;

        let mut output = stdout_reader.join().unwrap_or_default();
        output.push_str(&stderr_reader.join().unwrap_or_default());
        trace!(?path, output = %output, "exiftool output");
        Ok(output)
    }

    /// Wait for the child to exit, bounded by the configured timeout.
    fn wait_with_deadline(&self, child: &mut Child, path: &Path) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if child.try_wait()?.is_some() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                warn!(?path, exe = %self.exe.display(), "Killing hung exiftool process");
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::ExifToolTimeout {
                    path: path.to_path_buf(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }
}

impl DateResolver for ExifToolResolver {
    /// Probe the executable once up front so a missing tool is a run-level
    /// configuration error rather than a per-file mystery.
    fn check_available(&self) -> Result<()> {
        match Command::new(&self.exe)
            .arg("-ver")
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => {
                debug!(
                    exe = %self.exe.display(),
                    version = %String::from_utf8_lossy(&output.stdout).trim(),
                    "exiftool available"
                );
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::ExifToolNotFound {
                path: self.exe.clone(),
            }),
            Err(e) => Err(Error::ExifToolLaunch {
                path: self.exe.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn resolve(&self, path: &Path) -> Result<Option<DateBucket>> {
        let output = self.run_exiftool(path)?;
        let bucket = parse_bucket_output(&output);
        if bucket.is_none() {
            debug!(?path, "No Date/Time Original in exiftool output");
        }
        Ok(bucket)
    }
}

/// Scan merged exiftool output for the first `Date/Time Original` line and
/// parse the value after `": "` as a bucket.
fn parse_bucket_output(output: &str) -> Option<DateBucket> {
    let line = output
        .lines()
        .find(|line| line.starts_with(DATE_TIME_ORIGINAL_LABEL))?;
    let (_, value) = line.split_once(": ")?;
    value.parse().ok()
}

fn spawn_pipe_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bucket_output() {
        // Typical padded exiftool output
        let output = "Date/Time Original              : 2023/07\n";
        assert_eq!(
            parse_bucket_output(output),
            Some(DateBucket::new(2023, 7).unwrap())
        );

        // First matching line wins
        let output = "Warning: minor issue\nDate/Time Original : 2019/12\nDate/Time Original : 2020/01\n";
        assert_eq!(
            parse_bucket_output(output),
            Some(DateBucket::new(2019, 12).unwrap())
        );

        // No labeled line
        assert_eq!(parse_bucket_output(""), None);
        assert_eq!(parse_bucket_output("File Name : a.jpg\n"), None);

        // Labeled line with an unparsable value
        assert_eq!(
            parse_bucket_output("Date/Time Original : 0000:00:00\n"),
            None
        );
    }

    #[cfg(unix)]
    mod subprocess {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;

        /// Write a fake exiftool script into `dir` and return its path.
        fn fake_exiftool(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("exiftool");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn test_resolve_with_date_line() {
            let dir = tempfile::tempdir().unwrap();
            let exe = fake_exiftool(
                dir.path(),
                r#"echo "Date/Time Original              : 2023/07""#,
            );
            let resolver = ExifToolResolver::new(exe, Duration::from_secs(5));
            let bucket = resolver.resolve(Path::new("photo.jpg")).unwrap();
            assert_eq!(bucket, Some(DateBucket::new(2023, 7).unwrap()));
        }

        #[test]
        fn test_resolve_reads_stderr_too() {
            let dir = tempfile::tempdir().unwrap();
            let exe = fake_exiftool(
                dir.path(),
                r#"echo "Date/Time Original : 2021/03" 1>&2"#,
            );
            let resolver = ExifToolResolver::new(exe, Duration::from_secs(5));
            let bucket = resolver.resolve(Path::new("photo.jpg")).unwrap();
            assert_eq!(bucket, Some(DateBucket::new(2021, 3).unwrap()));
        }

        #[test]
        fn test_resolve_without_date_line() {
            let dir = tempfile::tempdir().unwrap();
            let exe = fake_exiftool(dir.path(), r#"echo "File Name : photo.jpg""#);
            let resolver = ExifToolResolver::new(exe, Duration::from_secs(5));
            assert_eq!(resolver.resolve(Path::new("photo.jpg")).unwrap(), None);
        }

        #[test]
        fn test_resolve_ignores_exit_code() {
            let dir = tempfile::tempdir().unwrap();
            let exe = fake_exiftool(
                dir.path(),
                "echo \"Date/Time Original : 2022/11\"\nexit 1",
            );
            let resolver = ExifToolResolver::new(exe, Duration::from_secs(5));
            let bucket = resolver.resolve(Path::new("photo.jpg")).unwrap();
            assert_eq!(bucket, Some(DateBucket::new(2022, 11).unwrap()));
        }

        #[test]
        fn test_missing_executable_is_configuration_error() {
            let resolver = ExifToolResolver::new("/no/such/exiftool", Duration::from_secs(5));
            assert!(matches!(
                resolver.check_available(),
                Err(Error::ExifToolNotFound { .. })
            ));
            assert!(matches!(
                resolver.resolve(Path::new("photo.jpg")),
                Err(Error::ExifToolNotFound { .. })
            ));
        }

        #[test]
        fn test_hung_tool_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let exe = fake_exiftool(dir.path(), "sleep 30");
            let resolver = ExifToolResolver::new(exe, Duration::from_millis(200));
            assert!(matches!(
                resolver.resolve(Path::new("photo.jpg")),
                Err(Error::ExifToolTimeout { .. })
            ));
        }
    }
}
