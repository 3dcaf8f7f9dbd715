//! [`ArtifactComputer`](crate::domain::ports::ArtifactComputer) 回傳的型別化產物。
//!
//! 編排器不解讀這些值，只把它們放進各模組的 bundle。表達式欄位是已生成的 C 片段。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 狀態、參數與觀測的標準索引
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Orders {
    #[serde(default)]
    pub order_states: BTreeMap<String, usize>,
    #[serde(default)]
    pub order_parameters: BTreeMap<String, usize>,
    #[serde(default)]
    pub order_observations: BTreeMap<String, usize>,
}

/// 確定性／隨機積分步驟
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegratorStep {
    #[serde(default)]
    pub caches: Vec<String>,
    /// 化簡後的流量項，Jacobian 查詢會再用到
    #[serde(default)]
    pub sf: Vec<String>,
    #[serde(default)]
    pub func: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Jacobian {
    #[serde(default)]
    pub caches: Vec<String>,
    #[serde(default)]
    pub jac: Vec<Vec<String>>,
    #[serde(default)]
    pub jac_obs: Vec<Vec<String>>,
    #[serde(default)]
    pub jac_diff: Vec<Vec<String>>,
}

/// 參數轉換、先驗與狀態表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(default)]
    pub pars: Vec<serde_json::Value>,
    /// 完整參數描述（含 `data.data` 先驗）
    #[serde(default)]
    pub parameters: Vec<serde_json::Value>,
    #[serde(default)]
    pub drifts: Vec<serde_json::Value>,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub order_states: BTreeMap<String, usize>,
    #[serde(default)]
    pub sde: Vec<serde_json::Value>,
    #[serde(default)]
    pub remainders: Vec<String>,
    #[serde(default)]
    pub par_sv: Vec<String>,
    #[serde(default)]
    pub f_remainders: BTreeMap<String, String>,
    #[serde(default)]
    pub f_remainders_var: BTreeMap<String, String>,
    #[serde(default)]
    pub map_name2prior_name: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observed {
    #[serde(default)]
    pub observed: Vec<serde_json::Value>,
}

/// 觀測模型對狀態的梯度
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationGradients {
    #[serde(default)]
    pub grads: BTreeMap<String, BTreeMap<String, String>>,
}

/// 生成程式碼迴圈使用的具名索引群組
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Iterators {
    #[serde(flatten)]
    pub groups: BTreeMap<String, Vec<usize>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResamplingAlloc {
    #[serde(default)]
    pub allocations: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResamplingStep {
    #[serde(default)]
    pub caches: Vec<String>,
    #[serde(default)]
    pub sf: Vec<String>,
    #[serde(default)]
    pub prob: Vec<serde_json::Value>,
    #[serde(default)]
    pub update: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResamplingIncrement {
    #[serde(default)]
    pub increments: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResamplingMultinomial {
    #[serde(default)]
    pub draws: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhiteNoise {
    #[serde(default)]
    pub terms: Vec<serde_json::Value>,
}

/// 各參數的擴散項總和
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffusionTerms {
    #[serde(default)]
    pub terms: Vec<serde_json::Value>,
}

/// 過程雜訊共變異數 (Q)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffusionMatrix {
    #[serde(default)]
    pub caches: Vec<String>,
    #[serde(default)]
    pub sys: Vec<serde_json::Value>,
    #[serde(default)]
    pub obs: Vec<serde_json::Value>,
}

/// 量測 Jacobian (Ht)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementJacobian {
    #[serde(default)]
    pub caches: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}
