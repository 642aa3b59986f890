//! Plain-text output for `--format text`.

use std::io::{self, Write};

use masterkey_engine::{
    AssignmentPlan, CapacityReport, HierarchyNode, HierarchyPreview, Severity, ValidationReport,
};

/// Print a hierarchy preview, one block per level.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn preview(out: &mut dyn Write, preview: &HierarchyPreview) -> io::Result<()> {
    writeln!(out, "{}", preview.summary)?;
    writeln!(out, "Doors: {}", preview.total_doors)?;
    for level in &preview.levels {
        writeln!(out)?;
        writeln!(out, "Level {}: {} ({})", level.level, level.name, level.count)?;
        for key in &level.keys {
            writeln!(out, "  {:<8} {} [{} doors]", key.symbol, key.name, key.door_count)?;
        }
    }
    writeln!(out)?;
    writeln!(out, "Estimated keys: {}", preview.estimated_total_keys)
}

/// Print the hierarchy as an indented tree.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn tree(out: &mut dyn Write, roots: &[HierarchyNode]) -> io::Result<()> {
    if roots.is_empty() {
        return writeln!(out, "(no hierarchy)");
    }
    for root in roots {
        node(out, root, 0)?;
    }
    Ok(())
}

fn node(out: &mut dyn Write, node: &HierarchyNode, indent: usize) -> io::Result<()> {
    writeln!(
        out,
        "{:indent$}{} {} ({})",
        "",
        node.level.key_symbol,
        node.level.name,
        node.level.level_type,
        indent = indent * 2
    )?;
    for child in &node.children {
        self::node(out, child, indent + 1)?;
    }
    Ok(())
}

/// Print a plan grouped by master.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn plan(out: &mut dyn Write, plan: &AssignmentPlan) -> io::Result<()> {
    for count in &plan.master_counts {
        writeln!(
            out,
            "{} {} <- {} ({} doors)",
            count.master.symbol, count.master.name, count.group_name, count.count
        )?;
        for entry in plan.change_keys_for(count.master.id) {
            writeln!(out, "  {:<10} {}", entry.change_key_symbol, entry.door_id)?;
        }
    }
    if !plan.unassigned_doors.is_empty() {
        writeln!(out, "Unplanned doors: {}", plan.unassigned_doors.len())?;
    }
    writeln!(out, "Change keys: {}", plan.total_change_keys)
}

/// Print validation findings, errors first.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn report(out: &mut dyn Write, report: &ValidationReport) -> io::Result<()> {
    for finding in report.findings() {
        let label = match finding.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        writeln!(out, "{label}[{}]: {}", finding.kind.as_str(), finding.message)?;
    }
    writeln!(
        out,
        "{} ({} errors, {} warnings)",
        if report.is_valid() { "valid" } else { "invalid" },
        report.errors.len(),
        report.warnings.len()
    )
}

/// Print capacity figures.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn capacity(out: &mut dyn Write, report: &CapacityReport) -> io::Result<()> {
    let s = &report.snapshot;
    writeln!(
        out,
        "Differs: {} / {} ({:.1}%, {} remaining)",
        s.differs_used, s.max_differs, report.usage_percentage, report.differs_remaining
    )?;
    writeln!(out, "Status: {}", report.status_label)?;
    writeln!(out, "Physical keys: {}", s.total_physical_keys)?;
    writeln!(out, "Cylinders: {}", s.total_cylinders)
}
