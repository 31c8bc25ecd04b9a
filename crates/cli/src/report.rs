//! Per-document failure diagnostics and batch reporting.

use recast_core::{ConvertError, JinjaTemplate};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Bytes of source shown on each side of the failure offset.
const CONTEXT_WINDOW: usize = 64;

// ──────────────────────────────────────────────
// Failure diagnostics
// ──────────────────────────────────────────────

/// Diagnostic rendering of one failed conversion: the error plus where it
/// happened in the source document.
pub(crate) struct FailureReport {
    pub template: String,
    pub message: String,
    pub offset: usize,
    pub line: usize,
    pub context: String,
    pub trace: Vec<&'static str>,
}

impl FailureReport {
    pub(crate) fn new(error: &ConvertError, source: &[u8]) -> Self {
        FailureReport {
            template: error.template.clone(),
            message: error.kind.to_string(),
            offset: error.offset,
            line: line_at(source, error.offset),
            context: context_window(source, error.offset),
            trace: error.trace.clone(),
        }
    }

    pub(crate) fn print(&self) {
        eprintln!("failed to convert template {}: {}", self.template, self.message);
        eprintln!("  stopped at byte {} (around line {})", self.offset, self.line);
        eprintln!("  context:\n{}", self.context);
        if !self.trace.is_empty() {
            eprintln!("  parser was in: {}", self.trace.join(" > "));
        }
    }

    pub(crate) fn to_json_value(&self) -> serde_json::Value {
        json!({
            "template": self.template,
            "error":    self.message,
            "offset":   self.offset,
            "line":     self.line,
            "trace":    self.trace,
        })
    }
}

/// 1-based line number containing `offset`.
fn line_at(source: &[u8], offset: usize) -> usize {
    let upto = offset.min(source.len());
    source[..upto].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Window of source around `offset`, clamped to the document bounds and
/// decoded lossily for display.
fn context_window(source: &[u8], offset: usize) -> String {
    let at = offset.min(source.len());
    let start = at.saturating_sub(CONTEXT_WINDOW);
    let end = (at + CONTEXT_WINDOW).min(source.len());
    String::from_utf8_lossy(&source[start..end]).into_owned()
}

// ──────────────────────────────────────────────
// Batch aggregation
// ──────────────────────────────────────────────

/// Accumulated results across one `convert` or `scan` run.
pub(crate) struct Batch {
    found: usize,
    records: Vec<JinjaTemplate>,
    failures: Vec<FailureReport>,
}

impl Batch {
    pub(crate) fn new(found: usize) -> Self {
        Batch {
            found,
            records: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn succeeded(&mut self, record: JinjaTemplate) {
        self.records.push(record);
    }

    pub(crate) fn failed(&mut self, failure: FailureReport) {
        self.failures.push(failure);
    }

    pub(crate) fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Import name to importing templates, both levels in name order.
    fn import_graph(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut graph: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for record in &self.records {
            for import in &record.imports {
                graph
                    .entry(import.as_str())
                    .or_default()
                    .push(record.name.as_str());
            }
        }
        graph
    }

    /// Distinct variable names across every converted template.
    fn unique_variables(&self) -> usize {
        let mut names: BTreeSet<&str> = BTreeSet::new();
        for record in &self.records {
            names.extend(record.variables.iter().map(String::as_str));
        }
        names.len()
    }

    pub(crate) fn print_text_summary(&self) {
        println!(
            "{} template(s) found, {} converted, {} failed",
            self.found,
            self.records.len(),
            self.failures.len()
        );
        let graph = self.import_graph();
        println!("Found {} unique imports", graph.len());
        println!("Found {} unique variables", self.unique_variables());
        if !graph.is_empty() {
            println!("Imports:");
            for (import, users) in &graph {
                println!("  {}: {}", import, users.len());
            }
        }
    }

    pub(crate) fn to_json_value(&self) -> serde_json::Value {
        json!({
            "found":     self.found,
            "converted": self.records.len(),
            "failed":    self.failures.len(),
            "templates": self.records,
            "failures":  self.failures.iter().map(FailureReport::to_json_value).collect::<Vec<_>>(),
            "imports":   self.import_graph(),
            "unique_variables": self.unique_variables(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::convert;

    #[test]
    fn line_numbers_are_one_based() {
        assert_eq!(line_at(b"a\nb\nc", 0), 1);
        assert_eq!(line_at(b"a\nb\nc", 2), 2);
        assert_eq!(line_at(b"a\nb\nc", 99), 3, "offset past the end clamps");
    }

    #[test]
    fn context_clamps_at_document_bounds() {
        let source = b"short";
        assert_eq!(context_window(source, 0), "short");
        assert_eq!(context_window(source, 999), "short");

        let long = vec![b'x'; 400];
        let window = context_window(&long, 200);
        assert_eq!(window.len(), 2 * CONTEXT_WINDOW);
    }

    #[test]
    fn batch_aggregates_imports_and_variables() {
        let mut batch = Batch::new(3);
        batch.succeeded(convert("a", b"%include;base\n%x;%y;").unwrap());
        batch.succeeded(convert("b", b"%include;base\n%x;").unwrap());
        let bad = convert("c", b"%end;").unwrap_err();
        batch.failed(FailureReport::new(&bad, b"%end;"));

        let v = batch.to_json_value();
        assert_eq!(v["found"], 3);
        assert_eq!(v["converted"], 2);
        assert_eq!(v["failed"], 1);
        assert_eq!(v["unique_variables"], 2);
        assert_eq!(v["imports"]["base"][0], "a");
        assert_eq!(v["imports"]["base"][1], "b");
        assert_eq!(v["failures"][0]["template"], "c");
        assert_eq!(v["templates"][0]["name"], "a");
        assert!(
            v["templates"][0].get("body").is_none(),
            "record bodies stay out of reports"
        );
    }
}
