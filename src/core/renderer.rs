use crate::core::bundle::{Module, ModuleBundle, RenderedModule};
use crate::core::workspace::commit_file;
use crate::domain::ports::Renderer;
use crate::utils::error::{BuildError, Result};
use minijinja::value::ValueKind;
use minijinja::{path_loader, AutoEscape, Environment, UndefinedBehavior, Value};
use std::fs;
use std::path::PathBuf;

/// 以 Jinja 樣板渲染模組原始碼的 Renderer。
///
/// 樣板從工作目錄的 `C/templates` 載入，`extends` / `include` 會在同一目錄解析；
/// `dict.items()` 之類的 Python 方法由 pycompat 支援。
pub struct TemplateRenderer {
    templates_dir: PathBuf,
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new<P: Into<PathBuf>>(templates_dir: P) -> Result<Self> {
        let templates_dir = templates_dir.into();

        let mut env = Environment::new();
        env.set_loader(path_loader(templates_dir.clone()));
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_unknown_method_callback(minijinja_contrib::pycompat::unknown_method_callback);
        env.add_filter("is_prior", is_prior);

        Ok(Self { templates_dir, env })
    }

    /// 渲染單一樣板；未定義的名稱會讓渲染失敗
    pub fn substitute<S: serde::Serialize>(
        &self,
        module: Module,
        template: &str,
        context: S,
    ) -> Result<String> {
        self.env
            .render_named_str(&module.template_file_name(), template, context)
            .map_err(|e| BuildError::Render {
                module: module.to_string(),
                message: e.to_string(),
            })
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, module: Module, bundle: &ModuleBundle) -> Result<RenderedModule> {
        let template_path = self.templates_dir.join(module.template_file_name());
        if !template_path.is_file() {
            return Err(BuildError::TemplateMissing {
                module: module.to_string(),
                path: template_path,
            });
        }

        let template = fs::read_to_string(&template_path)
            .map_err(|e| BuildError::io(format!("read template {}", module), &template_path, e))?;
        let context = bundle
            .to_context()
            .map_err(|e| BuildError::serialization(format!("building the {} bundle", module), e))?;
        let source = self.substitute(module, &template, &context)?;

        let output_path = self.templates_dir.join(module.output_file_name());
        commit_file(&output_path, source.as_bytes(), &format!("render {}", module))?;

        // 輸出已就位；此時刪除失敗代表樣板與輸出並存，只能整個重建
        fs::remove_file(&template_path).map_err(|e| {
            BuildError::io(format!("remove consumed template {}", module), &template_path, e)
        })?;

        tracing::debug!("Rendered {} ({} bytes)", output_path.display(), source.len());

        Ok(RenderedModule {
            module,
            path: output_path,
            bytes: source.len(),
        })
    }
}

/// 參數帶有先驗分佈：`p.data.data.distribution` 存在
fn is_prior(parameter: Value) -> bool {
    map_attr(&parameter, "data")
        .and_then(|data| map_attr(&data, "data"))
        .and_then(|inner| inner.get_attr("distribution").ok())
        .is_some_and(|distribution| !distribution.is_undefined())
}

fn map_attr(value: &Value, key: &str) -> Option<Value> {
    if value.kind() != ValueKind::Map {
        return None;
    }
    value
        .get_attr(key)
        .ok()
        .filter(|v| v.kind() == ValueKind::Map)
}
