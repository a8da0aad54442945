use serde::{Deserialize, Serialize};

pub mod collector;
pub mod formatter;
pub mod pipeline;

/// Exact reply the model is instructed to emit when a unit is clean.
pub const CLEAN_SENTINEL: &str = "✅ No security issues found in this configuration.";

/// Default system instructions sent with every audit request. Callers may
/// substitute their own template via [`pipeline::PipelineConfig`].
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a highly specialized and strict security auditor for Terraform code. Your ONLY task is to identify high-impact security vulnerabilities in the provided code block.

---
**CRITICAL INSTRUCTION: Your performance is judged on accuracy. You will be penalized for incorrectly identifying vulnerabilities in secure code. If you do not find a clear, high-impact vulnerability, you MUST follow the "no vulnerabilities" rule. Do NOT invent potential issues or suggest best-practice improvements if the code is already secure.**
---

**Definition of a Vulnerability:**
A vulnerability is a configuration that directly exposes a system to immediate and significant risk, such as public access (`0.0.0.0/0`), missing encryption, or `AdministratorAccess` IAM roles. Standard practices like hardcoding resource names are NOT vulnerabilities.

**Analysis Rules:**
1.  Analyze ONLY the provided Terraform code. Do not assume any context outside this code.
2.  If you find one or more clear vulnerabilities, your response MUST follow this exact format:
    - **Vulnerability:** [A one-sentence summary and its severity].
    - **Risk:** [A brief explanation of the risk].
    - **Remediation:** [The corrected, secure code block].
3.  If you find absolutely no vulnerabilities, you MUST respond with only this exact phrase and nothing else: `✅ No security issues found in this configuration.`
4.  Do not add any extra conversation or commentary. Your response must be either a list of vulnerabilities or the exact success phrase.

Begin your analysis now.
"#;

/// Whether one audit call covers a whole file or a single resource block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    File,
    Resource,
}

/// Classification of a single audited unit.
///
/// The evaluation deliberately trusts the model's natural-language reply: a
/// trimmed reply equal to [`CLEAN_SENTINEL`] is clean, anything else non-empty
/// counts as a finding. A reply that mixes commentary with the sentinel is
/// therefore misclassified as a finding; this is a known limitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Reply matched the sentinel phrase exactly.
    Clean,
    /// Reply reported at least one vulnerability.
    Finding,
    /// Reply was empty after trimming. Warned about, never blocking.
    Empty,
    /// Processing the unit failed; counted as a finding (fail closed).
    Failed,
}

impl UnitStatus {
    /// Classify a raw model reply.
    pub fn classify(reply: &str) -> Self {
        let trimmed = reply.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else if trimmed == CLEAN_SENTINEL {
            Self::Clean
        } else {
            Self::Finding
        }
    }

    /// True when this unit should fail the overall check.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Finding | Self::Failed)
    }
}

/// Result for one audited unit (a file, or one resource block within a file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    /// File path, suffixed with `#type.name` in resource mode.
    pub unit: String,
    /// Raw model reply, or the error description for failed units.
    pub detail: String,
    pub status: UnitStatus,
}

/// Accumulated outcome of one audit run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditRun {
    /// Number of matching files discovered, including skipped empty ones.
    pub files_scanned: usize,
    pub units: Vec<UnitReport>,
}

impl AuditRun {
    /// True when any unit blocks the check; decides the process exit code.
    pub fn vulnerabilities_found(&self) -> bool {
        self.units.iter().any(|unit| unit.status.is_blocking())
    }
}
