pub mod bundle;
pub mod engine;
pub mod orchestrator;
pub mod renderer;
pub mod snapshot;
pub mod workspace;

pub use crate::domain::model::{DataSnapshot, ModelSpec, ObservationStream};
pub use crate::domain::ports::{ArtifactComputer, ModelData, Renderer};
pub use crate::utils::error::Result;
