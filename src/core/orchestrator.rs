use crate::core::bundle::{Module, ModuleBundle, RenderedModule};
use crate::domain::model::ModelSpec;
use crate::domain::ports::{ArtifactComputer, Renderer};
use crate::utils::error::{BuildError, Result};
use std::sync::Arc;

/// 一次 generate 的結果
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub is_diff: bool,
    pub rendered: Vec<RenderedModule>,
}

/// 依相依順序計算產物並渲染所有模組。
///
/// 共用產物（orders、積分步驟、參數表）只計算一次，以 `Arc` 傳給每個使用者。
pub struct BuildOrchestrator<'a, A: ArtifactComputer + ?Sized, R: Renderer> {
    computer: &'a A,
    renderer: R,
}

impl<'a, A: ArtifactComputer + ?Sized, R: Renderer> BuildOrchestrator<'a, A, R> {
    pub fn new(computer: &'a A, renderer: R) -> Self {
        Self { computer, renderer }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// 計算所有 bundle，不寫任何檔案
    pub fn plan(&self, spec: &ModelSpec) -> Result<Vec<(Module, ModuleBundle)>> {
        let computer = self.computer;
        let is_diff = spec.is_diff();
        tracing::debug!("Diffusion flag for model '{}': {}", spec.name, is_diff);

        let orders = Arc::new(compute("orders", || computer.orders(spec))?);

        // ode_sde、jac 與 step_ekf 共用同一份積分步驟
        let step = Arc::new(compute("step_ode_sde", || computer.step_ode_sde(spec))?);
        let jac = compute("jac", || computer.jac(spec, &step.sf))?;

        let parameters = Arc::new(compute("parameters", || computer.parameters(spec))?);
        let observed = compute("observed", || computer.observed(spec))?;
        let h_grads = compute("h_grads", || computer.h_grads(spec))?;
        let iterators = compute("iterators", || computer.iterators(spec))?;

        let resampling = ModuleBundle::Resampling {
            orders: Arc::clone(&orders),
            alloc: compute("alloc_psr", || computer.alloc_psr(spec))?,
            is_diff,
            white_noise: compute("white_noise", || computer.white_noise(spec))?,
            step: compute("step_psr", || computer.step_psr(spec))?,
            step_inc: compute("step_psr_inc", || computer.step_psr_inc(spec))?,
            psr_multinomial: compute("step_psr_multinomial", || computer.step_psr_multinomial(spec))?,
        };

        let diff = compute("compute_diff", || computer.compute_diff(spec))?;
        let q = compute("eval_q", || computer.eval_q(spec))?;
        let ht = compute("ht", || computer.ht(spec))?;

        let parameters_bundle = || ModuleBundle::Parameters {
            parameters: Arc::clone(&parameters),
            orders: Arc::clone(&orders),
        };
        let integration_bundle = || ModuleBundle::Integration {
            is_diff,
            step: Arc::clone(&step),
            orders: Arc::clone(&orders),
        };

        Ok(vec![
            (Module::OdeSde, integration_bundle()),
            (Module::Transform, parameters_bundle()),
            (Module::Input, parameters_bundle()),
            (
                Module::Observed,
                ModuleBundle::Observed {
                    observed,
                    orders: Arc::clone(&orders),
                    h_grads,
                },
            ),
            (Module::Iterator, ModuleBundle::Iterators { iterators }),
            (Module::Psr, resampling),
            (
                Module::Diff,
                ModuleBundle::DiffusionSum {
                    diff,
                    orders: Arc::clone(&orders),
                },
            ),
            (
                Module::Q,
                ModuleBundle::DiffusionMatrix {
                    q,
                    is_diff,
                    orders: Arc::clone(&orders),
                },
            ),
            (
                Module::Ht,
                ModuleBundle::MeasurementJacobian {
                    ht,
                    is_diff,
                    orders: Arc::clone(&orders),
                },
            ),
            (
                Module::Jac,
                ModuleBundle::Jacobian {
                    jac,
                    is_diff,
                    orders: Arc::clone(&orders),
                },
            ),
            (Module::StepEkf, integration_bundle()),
            (Module::CheckIc, parameters_bundle()),
        ])
    }

    /// 渲染每個模組；任何失敗都會中止整個建置
    pub fn generate(&self, spec: &ModelSpec) -> Result<GenerationReport> {
        let plan = self.plan(spec)?;
        tracing::info!("🔧 Generating {} modules for model '{}'", plan.len(), spec.name);

        let mut rendered = Vec::with_capacity(plan.len());
        for (module, bundle) in &plan {
            match self.renderer.render(*module, bundle) {
                Ok(output) => {
                    tracing::info!("✅ Rendered module {}", module);
                    rendered.push(output);
                }
                Err(e) => {
                    tracing::error!("❌ Rendering module {} failed: {}", module, e);
                    return Err(e);
                }
            }
        }

        Ok(GenerationReport {
            is_diff: spec.is_diff(),
            rendered,
        })
    }
}

fn compute<T>(artifact: &'static str, query: impl FnOnce() -> anyhow::Result<T>) -> Result<T> {
    query().map_err(|e| {
        tracing::error!("❌ Artifact '{}' could not be computed: {}", artifact, e);
        BuildError::ArtifactComputation {
            artifact,
            source: e.into(),
        }
    })
}
