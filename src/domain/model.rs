use crate::utils::error::{BuildError, Result};
use crate::utils::validation::{self, Validate};
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// 狀態空間模型描述，建置過程中唯讀
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub parameters: Vec<String>,
    /// 具有擴散項（隨機微分）的參數子集
    #[serde(default)]
    pub par_diff: Vec<String>,
    #[serde(default)]
    pub observations: Vec<ObservationStream>,
    pub order_states: BTreeMap<String, usize>,
    pub t0: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationStream {
    pub name: String,
    #[serde(default)]
    pub definition: serde_json::Value,
}

impl ModelSpec {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| BuildError::io("read model", path.as_ref(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| BuildError::serialization("parsing model description", e))
    }

    pub fn is_diff(&self) -> bool {
        !self.par_diff.is_empty()
    }

    pub fn state_index(&self, state: &str) -> Option<usize> {
        self.order_states.get(state).copied()
    }

    /// ISO-8601 start timestamp；有小數秒時輸出六位微秒
    pub fn start(&self) -> String {
        if self.t0.nanosecond() / 1_000 == 0 {
            self.t0.format("%Y-%m-%dT%H:%M:%S").to_string()
        } else {
            self.t0.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
        }
    }
}

impl Validate for ModelSpec {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("model.name", &self.name)?;
        validation::validate_unique("model.parameters", self.parameters.iter().map(String::as_str))?;
        validation::validate_subset("model.par_diff", &self.par_diff, &self.parameters)?;
        validation::validate_unique(
            "model.observations",
            self.observations.iter().map(|o| o.name.as_str()),
        )?;
        Ok(())
    }
}

/// `.data.json` 的內容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSnapshot {
    pub start: String,
    pub data: serde_json::Value,
    pub covariates: serde_json::Value,
    /// 無序集合，序列化順序不具意義
    pub reset_all: BTreeSet<usize>,
}
