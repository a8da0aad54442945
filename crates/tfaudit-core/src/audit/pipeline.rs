use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use super::collector::collect_files;
use super::formatter::{format_resource, parse_resources};
use super::{AuditRun, Granularity, UnitReport, UnitStatus, DEFAULT_SYSTEM_PROMPT};
use crate::llm::AuditModel;

/// Knobs that collapse the historical per-file/per-resource pipeline variants
/// into one parameterized pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub granularity: Granularity,
    pub extension: String,
    pub system_prompt: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::File,
            extension: ".tf".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Sequential audit driver: collect files, send each unit to the model,
/// classify the replies, and accumulate the outcome.
pub struct AuditPipeline<M> {
    model: M,
    config: PipelineConfig,
}

impl<M: AuditModel> AuditPipeline<M> {
    pub fn new(model: M) -> Self {
        Self::with_config(model, PipelineConfig::default())
    }

    pub fn with_config(model: M, config: PipelineConfig) -> Self {
        Self { model, config }
    }

    /// Run the audit over `root`. An empty collection yields an empty, clean
    /// run. Per-unit failures are recorded as `Failed` and processing
    /// continues; an HCL syntax error in resource mode aborts the run.
    pub async fn run(&self, root: &Path) -> Result<AuditRun> {
        let files = collect_files(root, &self.config.extension);
        let mut run = AuditRun {
            files_scanned: files.len(),
            units: Vec::new(),
        };
        for path in &files {
            info!(file = %path.display(), "analyzing");
            match self.config.granularity {
                Granularity::File => {
                    if let Some(unit) = self.audit_file(path).await {
                        run.units.push(unit);
                    }
                }
                Granularity::Resource => {
                    run.units.extend(self.audit_resources(path).await?);
                }
            }
        }
        Ok(run)
    }

    async fn audit_file(&self, path: &Path) -> Option<UnitReport> {
        let label = path.display().to_string();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                let err = anyhow::Error::new(err).context(format!("failed to read {label}"));
                return Some(failed_unit(label, &err));
            }
        };
        if text.trim().is_empty() {
            info!(file = %label, "file is empty, skipping analysis");
            return None;
        }
        Some(self.audit_unit(label, &text).await)
    }

    async fn audit_resources(&self, path: &Path) -> Result<Vec<UnitReport>> {
        let label = path.display().to_string();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                let err = anyhow::Error::new(err).context(format!("failed to read {label}"));
                return Ok(vec![failed_unit(label, &err)]);
            }
        };
        if text.trim().is_empty() {
            info!(file = %label, "file is empty, skipping analysis");
            return Ok(Vec::new());
        }
        let resources = parse_resources(&text, &label)?;
        let mut units = Vec::with_capacity(resources.len());
        for resource in resources {
            let content = format_resource(&resource.kind, &resource.name, &resource.body);
            let unit = format!("{label}#{}.{}", resource.kind, resource.name);
            units.push(self.audit_unit(unit, &content).await);
        }
        Ok(units)
    }

    async fn audit_unit(&self, unit: String, content: &str) -> UnitReport {
        match self
            .model
            .audit(&self.config.system_prompt, content)
            .await
        {
            Ok(reply) => {
                let status = UnitStatus::classify(&reply);
                if status == UnitStatus::Empty {
                    warn!(unit = %unit, "empty response from model");
                }
                UnitReport {
                    unit,
                    detail: reply,
                    status,
                }
            }
            Err(err) => failed_unit(unit, &err),
        }
    }
}

fn failed_unit(unit: String, err: &anyhow::Error) -> UnitReport {
    warn!(unit = %unit, error = %format!("{err:#}"), "unit processing failed, counting as a finding");
    UnitReport {
        unit,
        detail: format!("audit failed: {err:#}"),
        status: UnitStatus::Failed,
    }
}
