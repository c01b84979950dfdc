//! Console narration for the idsweep CLI.

use idsweep_lib::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// How the final summary is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SummaryFormat {
    Text,
    Json,
}

type Output = Mutex<Box<dyn Write + Send>>;

/// Reporter that prints one line per item above a live spinner.
///
/// Item lines go through the progress bar so they never tear the spinner.
/// When the bar is not drawn (stderr is not a terminal) they are written to
/// stderr directly instead. The summary goes to stdout. Nothing here can fail
/// the run: write errors are logged and dropped.
pub(crate) struct ConsoleReporter {
    progress: ProgressBar,
    quiet: bool,
    format: SummaryFormat,
    lines: Output,
    summary: Output,
    completed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    streak: AtomicU32,
}

impl std::fmt::Debug for ConsoleReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleReporter")
            .field("progress", &self.progress)
            .field("quiet", &self.quiet)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl ConsoleReporter {
    pub(crate) fn new(quiet: bool, format: SummaryFormat) -> Self {
        let progress = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        };

        Self::with_outputs(
            progress,
            quiet,
            format,
            Box::new(std::io::stderr()),
            Box::new(std::io::stdout()),
        )
    }

    fn with_outputs(
        progress: ProgressBar,
        quiet: bool,
        format: SummaryFormat,
        lines: Box<dyn Write + Send>,
        summary: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            progress,
            quiet,
            format,
            lines: Mutex::new(lines),
            summary: Mutex::new(summary),
            completed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            streak: AtomicU32::new(0),
        }
    }

    fn line(&self, msg: String) {
        if self.quiet {
            return;
        }
        if !self.progress.is_hidden() {
            self.progress.println(msg);
            return;
        }

        let mut out = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{msg}") {
            tracing::warn!(error = %e, "Failed to write progress line");
        }
    }

    fn refresh(&self) {
        self.progress.set_message(format!(
            "{} downloaded, {} skipped, {} failed ({} in a row)",
            self.completed.load(Ordering::Relaxed),
            self.skipped.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
            self.streak.load(Ordering::Relaxed),
        ));
    }

    fn print_summary(&self, summary: &RunSummary) -> std::io::Result<()> {
        let mut out = self.summary.lock().unwrap_or_else(PoisonError::into_inner);
        match self.format {
            SummaryFormat::Json => {
                let json = summary.to_json_pretty().map_err(std::io::Error::other)?;
                writeln!(out, "{json}")?;
            }
            SummaryFormat::Text => {
                writeln!(
                    out,
                    "Stopped after {} consecutive failures.",
                    summary.consecutive_failures
                )?;
                writeln!(
                    out,
                    "Last successful URL: {}",
                    summary.last_successful_url.as_deref().unwrap_or("none")
                )?;
                writeln!(
                    out,
                    "Downloaded {}, skipped {}, failed {} (ids {}..{})",
                    summary.completed,
                    summary.skipped,
                    summary.failed,
                    summary.start_id,
                    summary.next_id
                )?;
            }
        }
        out.flush()
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: &SweepEvent<'_>) {
        match event {
            SweepEvent::Checking { candidate } => {
                self.line(format!("Checking video: {}", candidate.url));
            }
            SweepEvent::Downloading { candidate, .. } => {
                self.line(format!("Downloading: {}", candidate.url));
            }
            SweepEvent::Downloaded { candidate, .. } => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                self.streak.store(0, Ordering::Relaxed);
                self.line(format!("Downloaded: {}", candidate.file_name()));
            }
            SweepEvent::Skipped { candidate, reason } => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                self.line(format!("Skipped: {} ({reason})", candidate.file_name()));
            }
            SweepEvent::Failed {
                candidate,
                error,
                consecutive_failures,
            } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.streak.store(*consecutive_failures, Ordering::Relaxed);
                self.line(format!("Failed: {} ({error})", candidate.url));
            }
            SweepEvent::Draining {
                reason,
                consecutive_failures,
            } => {
                self.line(format!(
                    "No longer starting new downloads: {reason} ({consecutive_failures} consecutive failures)"
                ));
            }
        }
        self.refresh();
    }

    fn summarize(&self, summary: &RunSummary) {
        self.progress.finish_and_clear();
        if let Err(e) = self.print_summary(summary) {
            tracing::warn!(error = %e, "Failed to print run summary");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    /// Writer whose contents stay readable after it is boxed.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(quiet: bool, format: SummaryFormat) -> (ConsoleReporter, Captured, Captured) {
        let lines = Captured::default();
        let summary = Captured::default();
        let reporter = ConsoleReporter::with_outputs(
            ProgressBar::hidden(),
            quiet,
            format,
            Box::new(lines.clone()),
            Box::new(summary.clone()),
        );
        (reporter, lines, summary)
    }

    fn candidate(id: u64) -> Candidate {
        Candidate {
            id,
            url: format!("https://cdn.example.com/{id}.mp4"),
            destination: PathBuf::from(format!("videos/{id}.mp4")),
        }
    }

    fn summary(last_successful_url: Option<&str>) -> RunSummary {
        RunSummary {
            start_id: 1,
            next_id: 5,
            completed: 1,
            skipped: 0,
            failed: 3,
            consecutive_failures: 3,
            last_successful_url: last_successful_url.map(str::to_string),
            stop_reason: Some(StopReason::FailureThreshold),
        }
    }

    #[test]
    fn test_counts_follow_events() {
        let (reporter, _, _) = capture(true, SummaryFormat::Text);
        let first = candidate(1);
        let second = candidate(2);
        let error = ItemError::Status { status: 404 };

        reporter.report(&SweepEvent::Downloaded {
            candidate: &first,
            bytes: 10,
        });
        reporter.report(&SweepEvent::Failed {
            candidate: &second,
            error: &error,
            consecutive_failures: 1,
        });
        reporter.report(&SweepEvent::Skipped {
            candidate: &second,
            reason: SkipReason::Oversized { size: 2, limit: 1 },
        });

        assert_eq!(reporter.completed.load(Ordering::Relaxed), 1);
        assert_eq!(reporter.failed.load(Ordering::Relaxed), 1);
        assert_eq!(reporter.skipped.load(Ordering::Relaxed), 1);
        assert_eq!(reporter.streak.load(Ordering::Relaxed), 1);

        reporter.report(&SweepEvent::Downloaded {
            candidate: &first,
            bytes: 10,
        });
        assert_eq!(reporter.streak.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_item_lines_written_without_terminal() {
        let (reporter, lines, _) = capture(false, SummaryFormat::Text);
        let first = candidate(1);
        let second = candidate(2);
        let error = ItemError::Status { status: 404 };

        reporter.report(&SweepEvent::Checking { candidate: &first });
        reporter.report(&SweepEvent::Downloading {
            candidate: &first,
            size: 16,
        });
        reporter.report(&SweepEvent::Downloaded {
            candidate: &first,
            bytes: 16,
        });
        reporter.report(&SweepEvent::Checking { candidate: &second });
        reporter.report(&SweepEvent::Failed {
            candidate: &second,
            error: &error,
            consecutive_failures: 1,
        });

        let text = lines.text();
        let expected = [
            "Checking video: https://cdn.example.com/1.mp4",
            "Downloading: https://cdn.example.com/1.mp4",
            "Downloaded: 1.mp4",
            "Checking video: https://cdn.example.com/2.mp4",
            "Failed: https://cdn.example.com/2.mp4 (",
        ];
        let written: Vec<&str> = text.lines().collect();
        assert_eq!(written.len(), expected.len());
        for (line, prefix) in written.iter().zip(expected) {
            assert!(line.starts_with(prefix), "{line:?} should start with {prefix:?}");
        }
    }

    #[test]
    fn test_skip_line_shows_size() {
        let (reporter, lines, _) = capture(false, SummaryFormat::Text);
        reporter.report(&SweepEvent::Skipped {
            candidate: &candidate(3),
            reason: SkipReason::Oversized {
                size: 150 * 1024 * 1024,
                limit: 100 * 1024 * 1024,
            },
        });
        assert_eq!(
            lines.text(),
            "Skipped: 3.mp4 (File size 150.00 MB exceeds limit)\n"
        );
    }

    #[test]
    fn test_quiet_writes_no_item_lines() {
        let (reporter, lines, _) = capture(true, SummaryFormat::Text);
        reporter.report(&SweepEvent::Checking {
            candidate: &candidate(1),
        });
        assert!(lines.text().is_empty());
    }

    #[test]
    fn test_text_summary() {
        let (reporter, _, out) = capture(true, SummaryFormat::Text);
        reporter.summarize(&summary(Some("https://cdn.example.com/1.mp4")));
        assert_eq!(
            out.text(),
            "Stopped after 3 consecutive failures.\n\
             Last successful URL: https://cdn.example.com/1.mp4\n\
             Downloaded 1, skipped 0, failed 3 (ids 1..5)\n"
        );

        let (reporter, _, out) = capture(true, SummaryFormat::Text);
        reporter.summarize(&summary(None));
        assert!(out.text().contains("Last successful URL: none\n"));
    }

    #[test]
    fn test_json_summary() {
        let (reporter, _, out) = capture(true, SummaryFormat::Json);
        reporter.summarize(&summary(None));

        let value: serde_json::Value = serde_json::from_str(&out.text()).unwrap();
        assert_eq!(value["consecutive_failures"], 3);
        assert_eq!(value["next_id"], 5);
        assert_eq!(value["stop_reason"], "failure_threshold");
        assert!(value["last_successful_url"].is_null());
    }
}
