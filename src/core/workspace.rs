use crate::utils::error::{BuildError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const TEMPLATE_SUFFIX: &str = "_template.c";
pub const DATA_FILE_NAME: &str = ".data.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceState {
    Absent,
    Prepared,
    Populated,
    Archived,
}

/// 建置目錄。同一路徑同時只能有一個建置在執行，這裡不做鎖定。
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("C").join("templates")
    }

    pub fn data_path(&self) -> PathBuf {
        self.root.join(DATA_FILE_NAME)
    }

    /// `<parent>/<basename>.tar.gz`
    pub fn archive_path(&self) -> PathBuf {
        let basename = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workspace".to_string());
        let parent = self.root.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!("{}.tar.gz", basename))
    }

    pub fn state(&self) -> WorkspaceState {
        if !self.root.exists() {
            if self.archive_path().exists() {
                WorkspaceState::Archived
            } else {
                WorkspaceState::Absent
            }
        } else if self.data_path().exists() {
            WorkspaceState::Populated
        } else {
            WorkspaceState::Prepared
        }
    }

    /// 尚未被渲染的樣板檔名（排序後）
    pub fn pending_templates(&self) -> Result<Vec<String>> {
        let dir = self.templates_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut pending = Vec::new();
        let entries = fs::read_dir(&dir).map_err(|e| BuildError::io("list templates", &dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| BuildError::io("list templates", &dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(TEMPLATE_SUFFIX) {
                pending.push(name);
            }
        }
        pending.sort();
        Ok(pending)
    }

    /// 將樣板樹複製到 `<root>/C/templates`。
    ///
    /// `replace = false` 時只檢查目錄是否存在，不驗證內容。
    pub fn prepare(&self, template_source: &Path, replace: bool) -> Result<WorkspaceState> {
        if !template_source.is_dir() {
            return Err(BuildError::io(
                "prepare workspace",
                template_source,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "template source is not a directory",
                ),
            ));
        }

        if replace && self.root.exists() {
            tracing::debug!("Removing existing workspace {}", self.root.display());
            fs::remove_dir_all(&self.root)
                .map_err(|e| BuildError::io("remove existing workspace", &self.root, e))?;
        }

        if !self.root.exists() {
            copy_tree(template_source, &self.templates_dir())?;
            tracing::info!("📁 Workspace prepared at {}", self.root.display());
        } else {
            tracing::warn!(
                "Workspace {} already exists, keeping its contents",
                self.root.display()
            );
        }

        Ok(self.state())
    }

    /// 將工作目錄打包成 tar.gz，`replace` 時打包完成後刪除工作目錄。
    ///
    /// 不檢查生成是否完成。
    pub fn archive(&self, replace: bool) -> Result<PathBuf> {
        if !self.root.is_dir() {
            return Err(BuildError::io(
                "archive workspace",
                &self.root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "workspace does not exist"),
            ));
        }

        let archive_path = self.archive_path();
        let basename = self
            .root
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| {
                BuildError::io(
                    "archive workspace",
                    &self.root,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "workspace has no basename"),
                )
            })?;

        // 先打包到暫存檔，完整寫入後才 rename 成 `<name>.tar.gz`
        let staged = staged_path(&archive_path)
            .map_err(|e| BuildError::io("archive workspace", &archive_path, e))?;
        let write_staged = || -> std::io::Result<()> {
            let file = File::create(&staged)?;
            let mut tar = tar::Builder::new(GzEncoder::new(file, Compression::default()));
            tar.append_dir_all(&basename, &self.root)?;
            let mut file = tar.into_inner()?.finish()?;
            file.flush()?;
            file.sync_all()
        };

        if let Err(e) = write_staged() {
            let _ = fs::remove_file(&staged);
            return Err(BuildError::io("archive workspace", &archive_path, e));
        }
        if let Err(e) = fs::rename(&staged, &archive_path) {
            let _ = fs::remove_file(&staged);
            return Err(BuildError::io("archive workspace", &archive_path, e));
        }
        sync_parent_dir(&archive_path)
            .map_err(|e| BuildError::io("archive workspace", &archive_path, e))?;

        tracing::info!("📦 Archived workspace to {}", archive_path.display());

        if replace {
            fs::remove_dir_all(&self.root)
                .map_err(|e| BuildError::io("remove archived workspace", &self.root, e))?;
        }

        Ok(archive_path)
    }
}

fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
    fs::create_dir_all(destination)
        .map_err(|e| BuildError::io("create workspace", destination, e))?;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| source.to_path_buf());
            BuildError::io("copy templates", path, e.into())
        })?;

        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| {
                BuildError::io(
                    "copy templates",
                    entry.path(),
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
                )
            })?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| BuildError::io("copy templates", &target, e))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|e| BuildError::io("copy templates", entry.path(), e))?;
        }
    }

    Ok(())
}

/// `<dir>/.<name>.partial`
fn staged_path(path: &Path) -> std::io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    Ok(path.with_file_name(format!(".{}.partial", file_name.to_string_lossy())))
}

/// rename 之後同步父目錄，目錄項目才會落盤
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => File::open(parent)?.sync_all(),
        _ => File::open(".")?.sync_all(),
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// 先寫到暫存檔並 fsync，再 rename 到目標位置
pub(crate) fn commit_file(path: &Path, contents: &[u8], operation: &str) -> Result<()> {
    let staged = staged_path(path).map_err(|e| BuildError::io(operation, path, e))?;

    let write_staged = || -> std::io::Result<()> {
        let mut file = File::create(&staged)?;
        file.write_all(contents)?;
        file.sync_all()
    };

    if let Err(e) = write_staged() {
        let _ = fs::remove_file(&staged);
        return Err(BuildError::io(operation, &staged, e));
    }

    if let Err(e) = fs::rename(&staged, path) {
        let _ = fs::remove_file(&staged);
        return Err(BuildError::io(operation, path, e));
    }

    sync_parent_dir(path).map_err(|e| BuildError::io(operation, path, e))
}
