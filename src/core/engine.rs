use crate::core::bundle::RenderedModule;
use crate::core::orchestrator::BuildOrchestrator;
use crate::core::renderer::TemplateRenderer;
use crate::core::snapshot::DataSnapshotWriter;
use crate::core::workspace::Workspace;
use crate::domain::model::ModelSpec;
use crate::domain::ports::{ArtifactComputer, ModelData};
use crate::utils::error::{BuildError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub template_source: PathBuf,
    pub replace: bool,
    pub archive: bool,
    pub remove_after_archive: bool,
}

#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub stages: Vec<StageResult>,
    pub modules: Vec<RenderedModule>,
    pub snapshot_path: Option<PathBuf>,
    pub archive_path: Option<PathBuf>,
}

impl BuildReport {
    /// 建置摘要
    pub fn summary(&self) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();

        let total_duration: Duration = self.stages.iter().map(|s| s.duration).sum();
        summary.insert("total_stages".to_string(), serde_json::Value::Number(self.stages.len().into()));
        summary.insert(
            "modules_rendered".to_string(),
            serde_json::Value::Number(self.modules.len().into()),
        );
        summary.insert(
            "total_duration_ms".to_string(),
            serde_json::Value::Number((total_duration.as_millis() as u64).into()),
        );

        let stage_names: Vec<serde_json::Value> = self
            .stages
            .iter()
            .map(|s| serde_json::Value::String(s.stage.clone()))
            .collect();
        summary.insert("executed_stages".to_string(), serde_json::Value::Array(stage_names));

        summary
    }
}

/// 一次性的建置流程：prepare → generate → snapshot → archive
pub struct BuildEngine<'a, A: ArtifactComputer + ?Sized, D: ModelData + ?Sized> {
    workspace: Workspace,
    computer: &'a A,
    data: &'a D,
    options: BuildOptions,
}

impl<'a, A: ArtifactComputer + ?Sized, D: ModelData + ?Sized> BuildEngine<'a, A, D> {
    pub fn new(workspace: Workspace, computer: &'a A, data: &'a D, options: BuildOptions) -> Self {
        Self {
            workspace,
            computer,
            data,
            options,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn run(&self, spec: &ModelSpec) -> Result<BuildReport> {
        tracing::info!("🚀 Starting build for model '{}'", spec.name);
        let mut report = BuildReport::default();

        run_stage(&mut report, "prepare", || {
            self.workspace
                .prepare(&self.options.template_source, self.options.replace)
        })?;

        let generation = run_stage(&mut report, "generate", || {
            let renderer = TemplateRenderer::new(self.workspace.templates_dir())?;
            BuildOrchestrator::new(self.computer, renderer).generate(spec)
        })?;
        report.modules = generation.rendered;

        let snapshot_path = run_stage(&mut report, "write_data", || {
            DataSnapshotWriter::new().write(spec, self.data, &self.workspace)
        })?;
        report.snapshot_path = Some(snapshot_path);

        if self.options.archive {
            let archive_path = run_stage(&mut report, "archive", || {
                self.workspace.archive(self.options.remove_after_archive)
            })?;
            report.archive_path = Some(archive_path);
        }

        tracing::info!(
            "✅ Build for model '{}' completed ({} modules)",
            spec.name,
            report.modules.len()
        );
        Ok(report)
    }

    /// 只計算 bundle，不碰檔案系統
    pub fn dry_run(&self, spec: &ModelSpec) -> Result<Vec<String>> {
        let renderer = TemplateRenderer::new(self.workspace.templates_dir())?;
        let plan = BuildOrchestrator::new(self.computer, renderer)
            .plan(spec)
            .map_err(|e| stage_failed("plan", e))?;
        Ok(plan.iter().map(|(module, _)| module.output_file_name()).collect())
    }
}

fn run_stage<T>(
    report: &mut BuildReport,
    stage: &str,
    action: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let start_time = Instant::now();
    tracing::debug!("▶️ Stage {} started", stage);

    match action() {
        Ok(value) => {
            let duration = start_time.elapsed();
            tracing::info!("✅ Stage {} finished in {:?}", stage, duration);
            report.stages.push(StageResult {
                stage: stage.to_string(),
                duration,
            });
            Ok(value)
        }
        Err(e) => {
            tracing::error!("❌ Stage {} failed: {}", stage, e);
            Err(stage_failed(stage, e))
        }
    }
}

fn stage_failed(stage: &str, source: BuildError) -> BuildError {
    BuildError::StageFailed {
        stage: stage.to_string(),
        source: Box::new(source),
    }
}
