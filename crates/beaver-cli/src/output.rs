//! Terminal output formatting.

use colored::{ColoredString, Colorize};

use beaver_graph::{
    CorrectionStatus, Discrepancy, MigrationReport, RepairReport, StepStatus, SyncResult,
    ValidationReport,
};

/// Print a sync summary.
pub fn print_sync_result(result: &SyncResult) {
    println!("\n{}", "Sync complete:".green().bold());
    println!("  Nodes upserted:          {}", result.nodes_upserted);
    println!("  Relationships merged:    {}", result.relationships_merged);
    if result.relationships_skipped > 0 {
        println!(
            "  Relationships skipped:   {} {}",
            result.relationships_skipped.to_string().yellow(),
            "(missing endpoint)".dimmed()
        );
    }
    if result.relationships_removed > 0 {
        println!("  Relationships moved:     {}", result.relationships_removed);
    }
    if result.derived_rows_created > 0 {
        println!("  Derived rows created:    {}", result.derived_rows_created);
    }
}

/// Print counts side by side, then every discrepancy.
pub fn print_validation_report(report: &ValidationReport) {
    println!("{:<24} {:>10} {:>10} {:>8}", "Entity", "Relational", "Graph", "Diff");
    println!("{}", "─".repeat(55));

    for (kind, relational) in &report.counts_relational {
        let graph = report.counts_graph.get(kind).copied().unwrap_or(0);
        let diff = relational - graph;
        println!(
            "{:<24} {:>10} {:>10} {:>8}",
            kind.as_str(),
            relational,
            graph,
            diff_colored(diff)
        );
    }

    let orphans: Vec<_> = report
        .discrepancies
        .iter()
        .filter_map(|d| match d {
            Discrepancy::Orphans {
                kind,
                count,
                ids,
                description,
            } => Some((kind, count, ids, description)),
            Discrepancy::Count { .. } => None,
        })
        .collect();
    if !orphans.is_empty() {
        println!();
        for (kind, count, ids, description) in orphans {
            println!("{} {} ({})", "Orphans:".yellow().bold(), kind, count);
            println!("  {}", description.dimmed());
            println!("  ids: {}", truncate_ids(ids, 20));
        }
    }

    println!();
    if report.valid {
        println!("{}", "Stores are consistent.".green().bold());
    } else {
        println!(
            "{}",
            format!("{} discrepancies found.", report.discrepancies.len())
                .red()
                .bold()
        );
    }
}

/// Print repair corrections and the final verdict.
pub fn print_repair_report(report: &RepairReport) {
    if report.corrections.is_empty() && report.fixed {
        println!("{}", "Nothing to repair.".green());
        return;
    }

    for c in &report.corrections {
        let status = match &c.status {
            CorrectionStatus::Success => "ok".green(),
            CorrectionStatus::Failed { reason } => format!("failed: {reason}").red(),
        };
        println!(
            "  {:<8} {:<24} {:>6}  {}",
            format!("{:?}", c.action).to_lowercase(),
            c.entity,
            c.affected,
            status
        );
    }

    println!();
    if report.fixed {
        println!("{}", "Repair complete: stores are consistent.".green().bold());
    } else {
        println!(
            "{}",
            format!(
                "Repair incomplete: {} discrepancies remain.",
                report.remaining.len()
            )
            .red()
            .bold()
        );
        for d in &report.remaining {
            println!("  {} {}", "•".dimmed(), d.subject());
        }
    }
}

pub fn print_migration_report(report: &MigrationReport) {
    for step in &report.steps {
        let marker = match &step.status {
            StepStatus::Completed => "✓".green(),
            StepStatus::Warning { .. } => "!".yellow(),
        };
        println!(
            "  {} {:<18} {} {}",
            marker,
            step.step.as_str(),
            step.detail,
            format!("({} ms)", step.elapsed_ms).dimmed()
        );
        if let StepStatus::Warning { reason } = &step.status {
            println!("      {}", reason.yellow());
        }
    }

    println!();
    if report.has_warnings() {
        println!("{}", "Migration complete with warnings.".yellow().bold());
    } else {
        println!("{}", "Migration complete.".green().bold());
    }
}

fn diff_colored(diff: i64) -> ColoredString {
    match diff {
        0 => "0".dimmed(),
        d if d > 0 => format!("+{d}").red(),
        d => d.to_string().red(),
    }
}

/// Render at most `max` ids.
fn truncate_ids(ids: &[i64], max: usize) -> String {
    let shown: Vec<String> = ids.iter().take(max).map(|id| id.to_string()).collect();
    if ids.len() > max {
        format!("{}, ... ({} more)", shown.join(", "), ids.len() - max)
    } else {
        shown.join(", ")
    }
}
