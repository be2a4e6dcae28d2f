/// Text and JSON rendering of results.
///
/// Every function returns a `String`; callers decide where it goes.
use serde::Serialize;
use unbloat_core::model::{format_count, format_size};
use unbloat_core::{AnalysisReport, DeletionReport, DirectoryCandidate, ReferenceCheck};

/// Machine-readable snapshot of the candidate set after a command.
#[derive(Debug, Serialize)]
pub struct Output<'a, T: Serialize> {
    pub result: T,
    pub candidates: &'a [DirectoryCandidate],
    pub total_size_bytes: u64,
}

pub fn json<T: Serialize>(
    result: T,
    candidates: &[DirectoryCandidate],
    total_size_bytes: u64,
) -> anyhow::Result<String> {
    let output = Output {
        result,
        candidates,
        total_size_bytes,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Candidate table with the total underneath.
pub fn candidates(candidates: &[DirectoryCandidate], total: u64) -> String {
    if candidates.is_empty() {
        return "No unused directories.\n".to_string();
    }
    let mut out = String::from("Unused Directories Found:\n");
    for (i, candidate) in candidates.iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {:>12}  {}\n",
            i + 1,
            format_size(candidate.size_bytes),
            candidate.path
        ));
    }
    out.push_str(&format!("Total Unused Size: {}\n", format_size(total)));
    out
}

pub fn analysis(report: &AnalysisReport) -> String {
    let mut out = format!(
        "Scanned {} directories ({} files checked) in {} ms.\n{}\n",
        format_count(report.directories_scanned as u64),
        format_count(report.files_checked as u64),
        report.elapsed_ms,
        report.summary
    );
    if report.cancelled {
        out.push_str("Analysis was cancelled; results are partial.\n");
    }
    push_warnings(&mut out, report.warnings.iter());
    out
}

pub fn check(check: &ReferenceCheck) -> String {
    let mut out = format!(
        "{}: {} references in {} scenes\n",
        check.directory,
        check.matches.len(),
        check.scenes_scanned
    );
    for m in &check.matches {
        out.push_str(&format!(
            "  {} > {} > {}.{} -> {}\n",
            m.scene, m.object, m.component, m.field, m.asset
        ));
    }
    if check.cancelled {
        out.push_str("  check cancelled; candidate left unchanged\n");
    }
    push_warnings(&mut out, check.warnings.iter());
    out
}

pub fn deletion(report: &DeletionReport) -> String {
    if report.declined {
        return "Deletion cancelled.\n".to_string();
    }
    let mut out = String::new();
    for deleted in &report.deleted {
        out.push_str(&format!(
            "deleted  {:>12}  {}\n",
            format_size(deleted.size_bytes),
            deleted.path
        ));
        for nested in &deleted.nested {
            out.push_str(&format!("         {:>12}  {nested} (nested)\n", ""));
        }
    }
    for failed in &report.failed {
        out.push_str(&format!("FAILED   {}: {}\n", failed.path, failed.reason));
    }
    if report.cancelled {
        out.push_str("Stopped early; remaining directories were not attempted.\n");
    }
    out.push_str(&format!(
        "{} deleted, {} failed, {} freed.\n",
        report.deleted.len(),
        report.failed.len(),
        format_size(report.bytes_freed())
    ));
    push_warnings(&mut out, report.warnings.iter());
    out
}

fn push_warnings<'w>(out: &mut String, warnings: impl Iterator<Item = &'w unbloat_core::Warning>) {
    for warning in warnings {
        out.push_str(&format!("warning: {warning}\n"));
    }
}
