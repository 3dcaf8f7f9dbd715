use crate::core::bundle::{Module, ModuleBundle, RenderedModule};
use crate::domain::artifacts::{
    DiffusionMatrix, DiffusionTerms, IntegratorStep, Iterators, Jacobian, MeasurementJacobian,
    ObservationGradients, Observed, Orders, Parameters, ResamplingAlloc, ResamplingIncrement,
    ResamplingMultinomial, ResamplingStep, WhiteNoise,
};
use crate::domain::model::{ModelSpec, ObservationStream};
use crate::utils::error::Result;

/// 由模型描述計算各產物的外部元件。每個查詢必須是純函式。
pub trait ArtifactComputer {
    fn orders(&self, spec: &ModelSpec) -> anyhow::Result<Orders>;
    fn step_ode_sde(&self, spec: &ModelSpec) -> anyhow::Result<IntegratorStep>;
    /// `sf` 來自 [`IntegratorStep::sf`]
    fn jac(&self, spec: &ModelSpec, sf: &[String]) -> anyhow::Result<Jacobian>;
    fn parameters(&self, spec: &ModelSpec) -> anyhow::Result<Parameters>;
    fn observed(&self, spec: &ModelSpec) -> anyhow::Result<Observed>;
    fn h_grads(&self, spec: &ModelSpec) -> anyhow::Result<ObservationGradients>;
    fn iterators(&self, spec: &ModelSpec) -> anyhow::Result<Iterators>;
    fn alloc_psr(&self, spec: &ModelSpec) -> anyhow::Result<ResamplingAlloc>;
    fn step_psr(&self, spec: &ModelSpec) -> anyhow::Result<ResamplingStep>;
    fn step_psr_inc(&self, spec: &ModelSpec) -> anyhow::Result<ResamplingIncrement>;
    fn step_psr_multinomial(&self, spec: &ModelSpec) -> anyhow::Result<ResamplingMultinomial>;
    fn white_noise(&self, spec: &ModelSpec) -> anyhow::Result<WhiteNoise>;
    fn compute_diff(&self, spec: &ModelSpec) -> anyhow::Result<DiffusionTerms>;
    fn eval_q(&self, spec: &ModelSpec) -> anyhow::Result<DiffusionMatrix>;
    fn ht(&self, spec: &ModelSpec) -> anyhow::Result<MeasurementJacobian>;
}

/// 資料快照所需的資料存取介面
pub trait ModelData {
    /// 觀測事件發生時需要重設的狀態名稱
    fn inc_reset(&self, stream: &ObservationStream) -> anyhow::Result<Vec<String>>;
    fn prepared_data(&self) -> anyhow::Result<serde_json::Value>;
    fn prepared_covariates(&self) -> anyhow::Result<serde_json::Value>;
}

pub trait Renderer {
    fn render(&self, module: Module, bundle: &ModuleBundle) -> Result<RenderedModule>;
}
