use std::fmt::Write;

use crate::audit::{AuditRun, UnitStatus};

/// Render the full run for the console: one section per audited unit with the
/// raw model reply, then the overall verdict line.
pub fn render_run(run: &AuditRun) -> anyhow::Result<String> {
    let mut out = String::new();
    if run.files_scanned == 0 {
        writeln!(
            out,
            "No Terraform files found to audit in the specified path."
        )?;
        return Ok(out);
    }

    for unit in &run.units {
        writeln!(out, "--- Analysis for '{}' ---", unit.unit)?;
        match unit.status {
            UnitStatus::Empty => writeln!(out, "⚠️ Empty response from AI model.")?,
            UnitStatus::Failed => writeln!(out, "❌ {}", unit.detail)?,
            _ => writeln!(out, "{}", unit.detail)?,
        }
        writeln!(out)?;
    }

    if run.vulnerabilities_found() {
        writeln!(out, "❌ Security vulnerabilities detected. Failing the check.")?;
    } else {
        writeln!(out, "✅ No security vulnerabilities detected. Check passed.")?;
    }
    Ok(out)
}
