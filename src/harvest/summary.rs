use super::outcome::{Failure, ItemReport, Outcome};
use core::fmt::Write;
use owo_colors::OwoColorize;

/// Per-item results of one run, plus the outcome of the final aggregate publish
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<ItemReport>,
    pub aggregate_failure: Option<Failure>,

    /// Workers that stopped abnormally, taking their item reports with them
    pub lost_workers: usize,
}

impl RunSummary {
    pub fn push(&mut self, report: ItemReport) {
        self.reports.push(report);
    }

    #[must_use]
    pub fn published(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Published))
    }

    #[must_use]
    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Unchanged))
    }

    #[must_use]
    pub fn empty(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Empty))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed() > 0 || self.aggregate_failure.is_some() || self.lost_workers > 0
    }

    /// The report for `sdk_name`, if that collector ran
    #[must_use]
    pub fn report(&self, sdk_name: &str) -> Option<&ItemReport> {
        self.reports.iter().find(|r| r.sdk_name == sdk_name)
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// Write the end-of-run summary: one count line, then one line per failure.
    pub fn render<W: Write>(&self, writer: &mut W, use_colors: bool) -> core::fmt::Result {
        let published = self.published().to_string();
        let failed = self.failed().to_string();

        if use_colors {
            writeln!(
                writer,
                "{} published, {} unchanged, {} empty, {} failed",
                published.green().bold(),
                self.unchanged(),
                self.empty(),
                if self.failed() > 0 {
                    failed.red().bold().to_string()
                } else {
                    failed
                }
            )?;
        } else {
            writeln!(
                writer,
                "{published} published, {} unchanged, {} empty, {failed} failed",
                self.unchanged(),
                self.empty()
            )?;
        }

        for report in &self.reports {
            if let Some(failure) = report.failure() {
                if use_colors {
                    writeln!(writer, "  {} {}: {failure}", "✗".red(), report.sdk_name.bold())?;
                } else {
                    writeln!(writer, "  ✗ {}: {failure}", report.sdk_name)?;
                }
            }
        }

        if self.lost_workers > 0 {
            writeln!(writer, "  {} worker(s) stopped unexpectedly, their results are missing", self.lost_workers)?;
        }

        if let Some(failure) = &self.aggregate_failure {
            writeln!(writer, "  aggregate list not published: {failure}")?;
        }

        Ok(())
    }
}
