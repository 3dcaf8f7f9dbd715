use crate::domain::artifacts::{
    DiffusionMatrix, DiffusionTerms, IntegratorStep, Iterators, Jacobian, MeasurementJacobian,
    ObservationGradients, Observed, Orders, Parameters, ResamplingAlloc, ResamplingIncrement,
    ResamplingMultinomial, ResamplingStep, WhiteNoise,
};
use crate::domain::model::{ModelSpec, ObservationStream};
use crate::domain::ports::{ArtifactComputer, ModelData};
use crate::utils::error::{BuildError, Result};
use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 由上游工具預先計算好的產物與資料（單一 JSON 檔）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrecomputedArtifacts {
    #[serde(default)]
    pub artifacts: ArtifactTable,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub covariates: serde_json::Value,
    /// 觀測串流名稱 → 需重設的狀態名稱
    #[serde(default)]
    pub inc_reset: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactTable {
    pub orders: Option<Orders>,
    pub step_ode_sde: Option<IntegratorStep>,
    pub jac: Option<PrecomputedJacobian>,
    pub parameters: Option<Parameters>,
    pub observed: Option<Observed>,
    pub h_grads: Option<ObservationGradients>,
    pub iterators: Option<Iterators>,
    pub alloc_psr: Option<ResamplingAlloc>,
    pub step_psr: Option<ResamplingStep>,
    pub step_psr_inc: Option<ResamplingIncrement>,
    pub step_psr_multinomial: Option<ResamplingMultinomial>,
    pub white_noise: Option<WhiteNoise>,
    pub compute_diff: Option<DiffusionTerms>,
    pub eval_q: Option<DiffusionMatrix>,
    pub ht: Option<MeasurementJacobian>,
}

/// Jacobian 連同計算時使用的 `sf`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrecomputedJacobian {
    #[serde(default)]
    pub sf: Vec<String>,
    #[serde(flatten)]
    pub jacobian: Jacobian,
}

impl PrecomputedArtifacts {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| BuildError::io("read precomputed artifacts", path.as_ref(), e))?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| BuildError::serialization("parsing precomputed artifacts", e))
    }
}

fn require<T: Clone>(value: &Option<T>, key: &str) -> anyhow::Result<T> {
    value
        .clone()
        .ok_or_else(|| anyhow!("precomputed artifact '{}' is missing", key))
}

impl ArtifactComputer for PrecomputedArtifacts {
    fn orders(&self, _spec: &ModelSpec) -> anyhow::Result<Orders> {
        require(&self.artifacts.orders, "orders")
    }

    fn step_ode_sde(&self, _spec: &ModelSpec) -> anyhow::Result<IntegratorStep> {
        require(&self.artifacts.step_ode_sde, "step_ode_sde")
    }

    fn jac(&self, _spec: &ModelSpec, sf: &[String]) -> anyhow::Result<Jacobian> {
        let precomputed = require(&self.artifacts.jac, "jac")?;
        if precomputed.sf != sf {
            bail!("precomputed Jacobian was derived from a different integration step");
        }
        Ok(precomputed.jacobian)
    }

    fn parameters(&self, _spec: &ModelSpec) -> anyhow::Result<Parameters> {
        require(&self.artifacts.parameters, "parameters")
    }

    fn observed(&self, _spec: &ModelSpec) -> anyhow::Result<Observed> {
        require(&self.artifacts.observed, "observed")
    }

    fn h_grads(&self, _spec: &ModelSpec) -> anyhow::Result<ObservationGradients> {
        require(&self.artifacts.h_grads, "h_grads")
    }

    fn iterators(&self, _spec: &ModelSpec) -> anyhow::Result<Iterators> {
        require(&self.artifacts.iterators, "iterators")
    }

    fn alloc_psr(&self, _spec: &ModelSpec) -> anyhow::Result<ResamplingAlloc> {
        require(&self.artifacts.alloc_psr, "alloc_psr")
    }

    fn step_psr(&self, _spec: &ModelSpec) -> anyhow::Result<ResamplingStep> {
        require(&self.artifacts.step_psr, "step_psr")
    }

    fn step_psr_inc(&self, _spec: &ModelSpec) -> anyhow::Result<ResamplingIncrement> {
        require(&self.artifacts.step_psr_inc, "step_psr_inc")
    }

    fn step_psr_multinomial(&self, _spec: &ModelSpec) -> anyhow::Result<ResamplingMultinomial> {
        require(&self.artifacts.step_psr_multinomial, "step_psr_multinomial")
    }

    fn white_noise(&self, _spec: &ModelSpec) -> anyhow::Result<WhiteNoise> {
        // 沒有白噪音項的模型可以省略
        Ok(self.artifacts.white_noise.clone().unwrap_or_default())
    }

    fn compute_diff(&self, _spec: &ModelSpec) -> anyhow::Result<DiffusionTerms> {
        require(&self.artifacts.compute_diff, "compute_diff")
    }

    fn eval_q(&self, _spec: &ModelSpec) -> anyhow::Result<DiffusionMatrix> {
        require(&self.artifacts.eval_q, "eval_q")
    }

    fn ht(&self, _spec: &ModelSpec) -> anyhow::Result<MeasurementJacobian> {
        require(&self.artifacts.ht, "ht")
    }
}

impl ModelData for PrecomputedArtifacts {
    fn inc_reset(&self, stream: &ObservationStream) -> anyhow::Result<Vec<String>> {
        Ok(self.inc_reset.get(&stream.name).cloned().unwrap_or_default())
    }

    fn prepared_data(&self) -> anyhow::Result<serde_json::Value> {
        Ok(self.data.clone())
    }

    fn prepared_covariates(&self) -> anyhow::Result<serde_json::Value> {
        Ok(self.covariates.clone())
    }
}
