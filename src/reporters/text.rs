//! Text (terminal) reporter with colors and formatting

use crate::graph::Layer;
use crate::models::AnalysisReport;
use anyhow::Result;
use console::style;
use std::fmt::Write;

/// Rows shown per section before "...and N more"
const MAX_ROWS: usize = 10;

/// Render report as formatted terminal output
pub fn render(report: &AnalysisReport) -> Result<String> {
    let mut out = String::new();
    let s = &report.summary;

    // Header
    writeln!(out, "\n{}", style("Repo X-Ray").bold())?;
    writeln!(out, "{}", style("──────────────────────────────────────").dim())?;
    writeln!(out, "Root: {}", report.root)?;
    if let Some(pkg) = &report.root_package {
        writeln!(out, "Root package: {}", style(pkg).cyan())?;
    }
    writeln!(
        out,
        "Files: {}  Modules: {}  Edges: {}  Functions: {}\n",
        s.files, s.modules, s.edges, s.functions
    )?;

    // Layers
    writeln!(out, "{}", style("LAYERS").bold())?;
    for layer in [Layer::Foundation, Layer::Core, Layer::Orchestration, Layer::Leaf] {
        let modules = report.layers.get(layer);
        let preview: Vec<&str> = modules.iter().take(5).map(String::as_str).collect();
        writeln!(
            out,
            "  {:<14} {:>4}  {}",
            layer.to_string(),
            modules.len(),
            style(preview.join(", ")).dim()
        )?;
    }
    out.push('\n');

    // Priorities
    writeln!(
        out,
        "{} ({} formula)",
        style("PRIORITIES").bold(),
        report.formula
    )?;
    if report.priorities.is_empty() {
        writeln!(out, "  {}", style("nothing to rank").dim())?;
    }
    for (i, record) in report.priorities.iter().enumerate() {
        writeln!(
            out,
            "  {}  {}  {:<48}  {}",
            style(format!("{:>3}", i + 1)).dim(),
            style(format!("{:.3}", record.score)).yellow(),
            shorten(&record.file, 48),
            style(record.reasons.join(", ")).dim()
        )?;
    }
    out.push('\n');

    // Circular imports
    if !report.circular.is_empty() {
        writeln!(
            out,
            "{} ({})",
            style("CIRCULAR IMPORTS").bold(),
            report.circular.len()
        )?;
        for pair in report.circular.iter().take(MAX_ROWS) {
            writeln!(out, "  {} {} {}", style(&pair.a).red(), "<->", style(&pair.b).red())?;
        }
        more(&mut out, report.circular.len())?;
        out.push('\n');
    }

    // Orphans
    if !report.orphans.is_empty() {
        writeln!(out, "{} ({})", style("ORPHANS").bold(), report.orphans.len())?;
        for orphan in report.orphans.iter().take(MAX_ROWS) {
            writeln!(
                out,
                "  {:.2}  {:<48}  {}",
                orphan.confidence,
                shorten(&orphan.file.display().to_string(), 48),
                style(&orphan.reason).dim()
            )?;
        }
        more(&mut out, report.orphans.len())?;
        out.push('\n');
    }

    // Coupling
    let d = &report.distances;
    if !d.skipped && (!d.tightly_coupled.is_empty() || !d.hub_modules.is_empty()) {
        writeln!(
            out,
            "{} (max depth {}, avg {:.2})",
            style("COUPLING").bold(),
            d.max_depth,
            d.avg_depth
        )?;
        for pair in &d.tightly_coupled {
            writeln!(
                out,
                "  {} <-> {}  ({} / {} hops)",
                pair.a, pair.b, pair.forward, pair.backward
            )?;
        }
        for hub in &d.hub_modules {
            writeln!(
                out,
                "  hub {:<40} {} connections",
                hub.module, hub.connections
            )?;
        }
        out.push('\n');
    }

    // External dependencies
    if !report.external_deps.is_empty() {
        let mut names: Vec<&str> = report
            .external_deps
            .values()
            .flatten()
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        writeln!(
            out,
            "{} ({})",
            style("EXTERNAL DEPENDENCIES").bold(),
            names.len()
        )?;
        writeln!(out, "  {}\n", names.join(", "))?;
    }

    // Warnings and notes
    if !report.warnings.is_empty() {
        writeln!(out, "{} ({})", style("WARNINGS").bold(), report.warnings.len())?;
        for warning in report.warnings.iter().take(MAX_ROWS) {
            writeln!(out, "  {}: {}", style(&warning.path).yellow(), warning.message)?;
        }
        more(&mut out, report.warnings.len())?;
        out.push('\n');
    }
    for note in &report.notes {
        writeln!(out, "{}", style(format!("note: {}", note)).dim())?;
    }

    Ok(out)
}

fn more(out: &mut String, total: usize) -> std::fmt::Result {
    let remaining = total.saturating_sub(MAX_ROWS);
    if remaining > 0 {
        writeln!(out, "  {}", style(format!("...and {} more", remaining)).dim())?;
    }
    Ok(())
}

/// Keep the tail of long paths; count chars to stay on UTF-8 boundaries
fn shorten(path: &str, width: usize) -> String {
    let len = path.chars().count();
    if len <= width {
        return path.to_string();
    }
    let skip = len - (width - 3);
    format!("...{}", path.chars().skip(skip).collect::<String>())
}
