use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("No pending template for module '{module}' at {}", .path.display())]
    TemplateMissing { module: String, path: PathBuf },

    #[error("Workspace IO error during {operation} ({}): {source}", .path.display())]
    WorkspaceIo {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error while {context}: {source}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Artifact computation '{artifact}' failed: {source}")]
    ArtifactComputation {
        artifact: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Render error in module '{module}': {message}")]
    Render { module: String, message: String },

    #[error("Observation stream '{stream}' resets unknown state '{state}'")]
    UnknownState { stream: String, state: String },

    #[error("Configuration validation error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Build stage '{stage}' failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: Box<BuildError>,
    },
}

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Template,
    Workspace,
    Artifact,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl BuildError {
    /// 包裝 IO 錯誤並附上操作與路徑
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::WorkspaceIo {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        BuildError::Serialization {
            context: context.into(),
            source,
        }
    }

    /// 最內層的錯誤（跳過 stage 包裝）
    pub fn root(&self) -> &BuildError {
        match self {
            BuildError::StageFailed { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            BuildError::ConfigValidationError { .. }
            | BuildError::InvalidConfigValueError { .. }
            | BuildError::MissingConfigError { .. } => ErrorCategory::Configuration,
            BuildError::TemplateMissing { .. } | BuildError::Render { .. } => ErrorCategory::Template,
            BuildError::WorkspaceIo { .. } => ErrorCategory::Workspace,
            BuildError::ArtifactComputation { .. } => ErrorCategory::Artifact,
            BuildError::Serialization { .. } | BuildError::UnknownState { .. } => ErrorCategory::Data,
            BuildError::StageFailed { .. } => ErrorCategory::Workspace,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Template | ErrorCategory::Artifact | ErrorCategory::Data => {
                ErrorSeverity::High
            }
            // 工作目錄可能處於半完成狀態
            ErrorCategory::Workspace => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.root() {
            BuildError::ConfigValidationError { field, .. }
            | BuildError::InvalidConfigValueError { field, .. }
            | BuildError::MissingConfigError { field } => {
                format!("Fix the '{}' entry in the build configuration and run again", field)
            }
            BuildError::TemplateMissing { module, .. } => format!(
                "The template for '{}' was already consumed or never copied; rebuild with replace = true",
                module
            ),
            BuildError::ArtifactComputation { artifact, .. } => format!(
                "Check the model inputs that feed '{}', then rebuild with replace = true",
                artifact
            ),
            BuildError::UnknownState { state, .. } => {
                format!("Add '{}' to the model's state ordering table", state)
            }
            _ => "The workspace may be partially written; rebuild with replace = true".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BuildError::StageFailed { stage, source } => {
                format!("Build failed at stage '{}': {}", stage, source.root())
            }
            other => format!("Build failed: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failed_delegates_to_root() {
        let err = BuildError::StageFailed {
            stage: "generate".to_string(),
            source: Box::new(BuildError::TemplateMissing {
                module: "jac".to_string(),
                path: PathBuf::from("C/templates/jac_template.c"),
            }),
        };

        assert_eq!(err.category(), ErrorCategory::Template);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("generate"));
        assert!(err.user_friendly_message().contains("jac"));
        assert!(err.recovery_suggestion().contains("replace = true"));
    }

    #[test]
    fn test_workspace_errors_are_critical() {
        let err = BuildError::io(
            "archive",
            "/tmp/model",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.category(), ErrorCategory::Workspace);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.to_string().contains("archive"));
    }

    #[test]
    fn test_every_failure_is_at_least_medium() {
        let errors = [
            BuildError::MissingConfigError {
                field: "paths.model".to_string(),
            },
            BuildError::UnknownState {
                stream: "inc_out".to_string(),
                state: "X".to_string(),
            },
            BuildError::Render {
                module: "jac".to_string(),
                message: "undefined value".to_string(),
            },
        ];
        for err in errors {
            assert!(err.severity() >= ErrorSeverity::Medium, "{} is too mild", err);
        }
    }

    #[test]
    fn test_artifact_error_names_artifact() {
        let err = BuildError::ArtifactComputation {
            artifact: "step_ode_sde",
            source: anyhow::anyhow!("singular matrix").into(),
        };
        assert!(err.to_string().contains("step_ode_sde"));
        assert!(err.to_string().contains("singular matrix"));
    }
}
