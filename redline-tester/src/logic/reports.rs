use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::career::CareerSummary;

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    careers: usize,
    passed: usize,
    results: &'a [CareerSummary],
}

#[allow(clippy::cast_precision_loss)]
fn pass_rate(results: &[CareerSummary]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    passed as f64 / results.len() as f64 * 100.0
}

/// # Errors
///
/// Returns an error if the report cannot be written.
pub fn write_console_report(
    out: &mut dyn Write,
    results: &[CareerSummary],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Career Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "============================".cyan())?;

    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Careers: {}", results.len())?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (results.len() - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", pass_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{} {}", status, result.profile_id.bold())?;
        writeln!(
            out,
            "   Races: {}/{} slots, {} wins ({:.1}%), {} skipped",
            result.races_run,
            result.race_slots,
            result.wins,
            result.win_rate(),
            result.skipped
        )?;
        writeln!(
            out,
            "   Level {} with ${} (earned {}, spent {})",
            result.final_level, result.final_money, result.money_earned, result.money_spent
        )?;
        writeln!(
            out,
            "   Garage: {} cars, {} upgrades, {} parts; tasks {}/{} claimed; {} achievements",
            result.cars_owned,
            result.upgrades_bought,
            result.parts_bought,
            result.tasks_claimed,
            result.tasks_completed,
            result.achievements.len()
        )?;
        if !result.rejections.is_empty() {
            let rejections: Vec<String> = result
                .rejections
                .iter()
                .map(|(key, count)| format!("{key}×{count}"))
                .collect();
            writeln!(out, "   Rejections: {}", rejections.join(", ").yellow())?;
        }
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    if let Some(best) = results.iter().max_by_key(|r| r.final_money) {
        writeln!(out, "{}", "⚡ Economy".bright_yellow().bold())?;
        writeln!(out, "{}", "=========".yellow())?;
        writeln!(out, "Richest: {} (${})", best.profile_id.green(), best.final_money)?;
    }
    if let Some(top) = results.iter().max_by_key(|r| r.final_level) {
        writeln!(out, "Highest level: {} (L{})", top.profile_id.green(), top.final_level)?;
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json_report(out: &mut dyn Write, results: &[CareerSummary], generated_at: DateTime<Utc>) -> Result<()> {
    let report = JsonReport {
        generated_at: generated_at.to_rfc3339(),
        careers: results.len(),
        passed: results.iter().filter(|r| r.passed).count(),
        results,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the report cannot be written.
pub fn write_markdown_report(out: &mut dyn Write, results: &[CareerSummary], generated_at: DateTime<Utc>) -> Result<()> {
    writeln!(out, "# Redline Career Simulation Results\n")?;
    writeln!(out, "_Generated {}_\n", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;

    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Careers**: {}", results.len())?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", results.len() - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", pass_rate(results))?;

    writeln!(out, "## Careers\n")?;
    writeln!(out, "| Profile | Races | Win % | Level | Money | Cars | Achievements |")?;
    writeln!(out, "|---|---|---|---|---|---|---|")?;
    for result in results {
        writeln!(
            out,
            "| {} {} | {}/{} | {:.1} | {} | {} | {} | {} |",
            if result.passed { "✅" } else { "❌" },
            result.profile_id,
            result.races_run,
            result.race_slots,
            result.win_rate(),
            result.final_level,
            result.final_money,
            result.cars_owned,
            result.achievements.len()
        )?;
    }

    let failing: Vec<&CareerSummary> = results.iter().filter(|r| !r.passed).collect();
    if !failing.is_empty() {
        writeln!(out, "\n## Failures\n")?;
        for result in failing {
            writeln!(out, "### {}\n", result.profile_id)?;
            for failure in &result.failures {
                writeln!(out, "- {failure}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
