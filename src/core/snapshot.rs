use crate::core::workspace::{commit_file, Workspace};
use crate::domain::model::{DataSnapshot, ModelSpec};
use crate::domain::ports::ModelData;
use crate::utils::error::{BuildError, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// 將資料、共變量與重設狀態索引寫成 `.data.json`
#[derive(Debug, Default, Clone, Copy)]
pub struct DataSnapshotWriter;

impl DataSnapshotWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn build<D: ModelData + ?Sized>(&self, spec: &ModelSpec, data: &D) -> Result<DataSnapshot> {
        let mut reset_all = BTreeSet::new();

        for stream in &spec.observations {
            let states = data.inc_reset(stream).map_err(|e| BuildError::ArtifactComputation {
                artifact: "inc_reset",
                source: e.into(),
            })?;

            for state in states {
                let index = spec.state_index(&state).ok_or_else(|| BuildError::UnknownState {
                    stream: stream.name.clone(),
                    state: state.clone(),
                })?;
                reset_all.insert(index);
            }
        }

        let data_rows = data.prepared_data().map_err(|e| BuildError::ArtifactComputation {
            artifact: "prepare_data",
            source: e.into(),
        })?;
        let covariates = data
            .prepared_covariates()
            .map_err(|e| BuildError::ArtifactComputation {
                artifact: "prepare_covariates",
                source: e.into(),
            })?;

        Ok(DataSnapshot {
            start: spec.start(),
            data: data_rows,
            covariates,
            reset_all,
        })
    }

    pub fn write<D: ModelData + ?Sized>(
        &self,
        spec: &ModelSpec,
        data: &D,
        workspace: &Workspace,
    ) -> Result<PathBuf> {
        let snapshot = self.build(spec, data)?;
        let json = serde_json::to_vec(&snapshot)
            .map_err(|e| BuildError::serialization("encoding the data snapshot", e))?;

        let path = workspace.data_path();
        commit_file(&path, &json, "write data snapshot")?;

        tracing::info!(
            "💾 Data snapshot written to {} ({} reset indices)",
            path.display(),
            snapshot.reset_all.len()
        );
        Ok(path)
    }
}
