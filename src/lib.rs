pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::precomputed::PrecomputedArtifacts;
pub use config::BuildConfig;
pub use crate::core::{
    bundle::{Module, ModuleBundle, RenderedModule},
    engine::{BuildEngine, BuildOptions, BuildReport},
    orchestrator::{BuildOrchestrator, GenerationReport},
    renderer::TemplateRenderer,
    snapshot::DataSnapshotWriter,
    workspace::{Workspace, WorkspaceState},
};
pub use utils::error::{BuildError, Result};
