//! Result collection and report rendering.
//!
//! A [`ResultCollector`] accumulates the failure entries produced by one
//! component. Collectors are folded into a cumulative collector with
//! [`ResultCollector::merge`], which is an order-preserving append. A batch
//! passes when the cumulative collector holds no failures.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Failure category used for errors raised by a component itself.
pub const EXCEPTION_CATEGORY: &str = "exception";

/// One recorded QA failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Failure {
    /// What the failure is about: a batch id or a file inside the batch.
    pub subject_id: String,

    /// Failure category, e.g. `exception`, `checksum`, `metadata`.
    pub category: String,

    /// Which check or component produced it.
    pub detail: String,

    /// Human-readable description.
    pub message: String,

    /// Diagnostic trace, empty when not applicable.
    pub trace: String,
}

/// Name and version of a component whose results were collected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Provenance {
    pub name: String,
    pub version: String,
}

/// Mutable aggregation of failures for one component or a whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultCollector {
    component_name: String,
    component_version: String,
    contributors: Vec<Provenance>,
    entries: Vec<Failure>,
}

impl ResultCollector {
    /// Create an empty collector on behalf of the named component.
    pub fn new(component_name: impl Into<String>, component_version: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            component_version: component_version.into(),
            contributors: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn component_version(&self) -> &str {
        &self.component_version
    }

    /// Record a failure.
    pub fn add_failure(
        &mut self,
        subject_id: impl Into<String>,
        category: impl Into<String>,
        detail: impl Into<String>,
        message: impl Into<String>,
        trace: impl Into<String>,
    ) {
        self.entries.push(Failure {
            subject_id: subject_id.into(),
            category: category.into(),
            detail: detail.into(),
            message: message.into(),
            trace: trace.into(),
        });
    }

    /// Failures in the order they were recorded.
    pub fn failures(&self) -> &[Failure] {
        &self.entries
    }

    pub fn failure_count(&self) -> usize {
        self.entries.len()
    }

    /// Components whose collectors were merged into this one, in merge order.
    pub fn contributors(&self) -> &[Provenance] {
        &self.contributors
    }

    /// True if and only if no failure has been recorded.
    pub fn is_success(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `other` onto `self`, consuming it.
    ///
    /// Entries keep their order and are never deduplicated, so folding
    /// `[c1, c2, c3]` yields `c1 ++ c2 ++ c3` however the fold is grouped.
    /// `other` and everything merged into it are appended to the
    /// contributors.
    pub fn merge(mut self, other: ResultCollector) -> ResultCollector {
        let ResultCollector {
            component_name,
            component_version,
            contributors,
            entries,
        } = other;

        self.contributors.push(Provenance {
            name: component_name,
            version: component_version,
        });
        self.contributors.extend(contributors);
        self.entries.extend(entries);
        self
    }

    /// Render a deterministic plain-text report.
    ///
    /// Traces are omitted unless `with_traces` is set.
    pub fn render(&self, with_traces: bool) -> String {
        let mut out = String::new();
        let verdict = if self.is_success() { "SUCCESS" } else { "FAILURE" };

        // Writing into a String cannot fail
        let _ = writeln!(
            out,
            "{} {}: {} ({} failure(s))",
            self.component_name,
            self.component_version,
            verdict,
            self.entries.len()
        );

        if !self.contributors.is_empty() {
            let names: Vec<String> = self
                .contributors
                .iter()
                .map(|p| format!("{} {}", p.name, p.version))
                .collect();
            let _ = writeln!(out, "components: {}", names.join(", "));
        }

        for (i, failure) in self.entries.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. [{}] {} ({}): {}",
                i + 1,
                failure.category,
                failure.subject_id,
                failure.detail,
                failure.message
            );
            if with_traces && !failure.trace.is_empty() {
                for line in failure.trace.lines() {
                    let _ = writeln!(out, "      {line}");
                }
            }
        }

        out
    }

    /// Plain-text report without traces.
    pub fn to_report(&self) -> String {
        self.render(false)
    }

    /// Pretty-printed JSON report, traces included.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let doc = serde_json::json!({
            "component": self.component_name,
            "version": self.component_version,
            "success": self.is_success(),
            "failure_count": self.entries.len(),
            "components": self.contributors,
            "failures": self.entries,
        });
        serde_json::to_string_pretty(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector_with(name: &str, subjects: &[&str]) -> ResultCollector {
        let mut c = ResultCollector::new(name, "1.0");
        for subject in subjects {
            c.add_failure(*subject, "checksum", name, format!("bad {subject}"), "");
        }
        c
    }

    #[test]
    fn test_new_collector_is_success() {
        let c = ResultCollector::new("structure", "1.0");
        assert!(c.is_success());
        assert_eq!(c.failure_count(), 0);
        assert_eq!(c.component_name(), "structure");
        assert_eq!(c.component_version(), "1.0");
    }

    #[test]
    fn test_add_failure_marks_failure() {
        let c = collector_with("structure", &["page1.pdf"]);
        assert!(!c.is_success());
        assert_eq!(c.failures()[0].subject_id, "page1.pdf");
        assert_eq!(c.failures()[0].category, "checksum");
    }

    #[test]
    fn test_merge_records_provenance() {
        let total = ResultCollector::new("batch", "0.3.1")
            .merge(collector_with("start", &[]))
            .merge(collector_with("structure", &["a"]));

        let names: Vec<&str> = total.contributors().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["start", "structure"]);
        assert_eq!(total.component_name(), "batch");
        assert_eq!(total.failure_count(), 1);
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        let total = ResultCollector::new("batch", "1")
            .merge(collector_with("a", &["x"]))
            .merge(collector_with("a", &["x"]));
        assert_eq!(total.failure_count(), 2);
    }

    #[test]
    fn test_report_lists_failures_in_order() {
        let total = ResultCollector::new("batch", "1")
            .merge(collector_with("structure", &["p1.pdf", "p2.pdf"]))
            .merge(collector_with("metadata", &["p3.xml"]));
        let report = total.to_report();

        assert!(report.starts_with("batch 1: FAILURE (3 failure(s))"));
        let p1 = report.find("p1.pdf").expect("p1");
        let p2 = report.find("p2.pdf").expect("p2");
        let p3 = report.find("p3.xml").expect("p3");
        assert!(p1 < p2 && p2 < p3);
        assert!(report.contains("components: structure 1.0, metadata 1.0"));
    }

    #[test]
    fn test_report_is_deterministic() {
        let total = ResultCollector::new("batch", "1").merge(collector_with("s", &["x", "y"]));
        assert_eq!(total.to_report(), total.clone().to_report());
    }

    #[test]
    fn test_report_traces_only_when_requested() {
        let mut c = ResultCollector::new("batch", "1");
        c.add_failure("B-1", EXCEPTION_CATEGORY, "Boom", "boom", "at line 1\nat line 2");

        assert!(!c.render(false).contains("at line 2"));
        assert!(c.render(true).contains("      at line 2"));
    }

    #[test]
    fn test_json_report() {
        let c = ResultCollector::new("batch", "1").merge(collector_with("structure", &["x"]));
        let json: serde_json::Value =
            serde_json::from_str(&c.to_json().expect("json")).expect("parse");
        assert_eq!(json["success"], false);
        assert_eq!(json["failure_count"], 1);
        assert_eq!(json["failures"][0]["subject_id"], "x");
        assert_eq!(json["components"][0]["name"], "structure");
    }
}
