use crate::core::engine::BuildOptions;
use crate::utils::error::{BuildError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const LOG_FORMATS: [&str; 2] = ["compact", "json"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub build: BuildSection,
    pub paths: PathsConfig,
    pub workspace: Option<WorkspaceConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// 模型描述 JSON
    pub model: String,
    /// 預先計算的產物 JSON
    pub inputs: String,
    pub templates: String,
    pub workspace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub replace: Option<bool>,
    pub archive: Option<bool>,
    pub remove_after_archive: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl BuildConfig {
    /// 從 TOML 檔案載入配置；相對路徑以設定檔所在目錄為準
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| BuildError::io("read build config", path.as_ref(), e))?;
        let mut config = Self::from_toml_str(&content)?;

        if let Some(base) = path.as_ref().parent() {
            config.paths.resolve_against(base);
        }
        Ok(config)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BuildError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MODEL_ROOT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BuildError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("build.name", &self.build.name)?;
        validation::validate_path("paths.model", &self.paths.model)?;
        validation::validate_path("paths.inputs", &self.paths.inputs)?;
        validation::validate_path("paths.templates", &self.paths.templates)?;
        validation::validate_path("paths.workspace", &self.paths.workspace)?;

        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            validation::validate_one_of("logging.format", format, &LOG_FORMATS)?;
        }

        Ok(())
    }

    pub fn replace(&self) -> bool {
        self.workspace.as_ref().and_then(|w| w.replace).unwrap_or(true)
    }

    pub fn archive(&self) -> bool {
        self.workspace.as_ref().and_then(|w| w.archive).unwrap_or(false)
    }

    pub fn remove_after_archive(&self) -> bool {
        self.workspace
            .as_ref()
            .and_then(|w| w.remove_after_archive)
            .unwrap_or(true)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.format.as_deref()) == Some("json")
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            template_source: PathBuf::from(&self.paths.templates),
            replace: self.replace(),
            archive: self.archive(),
            remove_after_archive: self.remove_after_archive(),
        }
    }
}

impl PathsConfig {
    fn resolve_against(&mut self, base: &Path) {
        for path in [
            &mut self.model,
            &mut self.inputs,
            &mut self.templates,
            &mut self.workspace,
        ] {
            if !path.is_empty() && Path::new(path.as_str()).is_relative() {
                *path = base.join(path.as_str()).to_string_lossy().into_owned();
            }
        }
    }
}

impl Validate for BuildConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
