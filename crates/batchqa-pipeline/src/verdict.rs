//! Mapping a cumulative result to a report and a process exit status.

use batchqa_core::ResultCollector;

/// Process exit status of a batchqa invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every check passed.
    Success,

    /// At least one failure was recorded.
    Failures,

    /// Bad arguments or setup failed; the pipeline never ran.
    Usage,
}

impl ExitStatus {
    /// Numeric process exit code.
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failures => 1,
            ExitStatus::Usage => 2,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

/// Report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct Verdict {
    /// Whether no failure was recorded.
    pub success: bool,

    /// Number of failure entries.
    pub failure_count: usize,

    /// Exit status to terminate with.
    pub status: ExitStatus,

    /// Rendered report.
    pub report: String,
}

impl Verdict {
    /// Evaluate the cumulative collector of a pipeline run.
    pub fn evaluate(
        result: &ResultCollector,
        format: ReportFormat,
        with_traces: bool,
    ) -> anyhow::Result<Self> {
        let success = result.is_success();
        let report = match format {
            ReportFormat::Text => result.render(with_traces),
            ReportFormat::Json => result.to_json()?,
        };

        Ok(Self {
            success,
            failure_count: result.failure_count(),
            status: if success {
                ExitStatus::Success
            } else {
                ExitStatus::Failures
            },
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Failures.code(), 1);
        assert_eq!(ExitStatus::Usage.code(), 2);
    }

    #[test]
    fn test_clean_result_succeeds() {
        let result = ResultCollector::new("batch", "1").merge(ResultCollector::new("start", "1"));
        let verdict = Verdict::evaluate(&result, ReportFormat::Text, false).expect("verdict");

        assert!(verdict.success);
        assert_eq!(verdict.failure_count, 0);
        assert_eq!(verdict.status, ExitStatus::Success);
        assert!(verdict.report.contains("SUCCESS"));
    }

    #[test]
    fn test_single_failure_fails() {
        let mut step = ResultCollector::new("metadata", "1");
        step.add_failure("B-1", "metadata", "metadata", "missing page1.xml", "");
        let result = ResultCollector::new("batch", "1").merge(step);

        let verdict = Verdict::evaluate(&result, ReportFormat::Text, false).expect("verdict");
        assert!(!verdict.success);
        assert_eq!(verdict.status, ExitStatus::Failures);
        assert!(verdict.report.contains("missing page1.xml"));
    }

    #[test]
    fn test_json_report_format() {
        let result = ResultCollector::new("batch", "1");
        let verdict = Verdict::evaluate(&result, ReportFormat::Json, false).expect("verdict");
        let json: serde_json::Value = serde_json::from_str(&verdict.report).expect("json");
        assert_eq!(json["success"], true);
    }
}
