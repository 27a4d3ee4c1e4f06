//! Read-only file browser confined to a root directory.

use crate::config::FilesConfig;
use anyhow::{Context, bail};
use std::path::{Component, Path, PathBuf};

/// Directories never listed, read or searched.
const EXCLUDED_DIRS: &[&str] = &[".ssh", ".aws", ".config", ".gnupg", ".keychain", ".git"];

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "csv", "json", "html", "py", "js", "css", "yaml", "yml", "toml", "sh", "ini",
    "conf", "rs", "log",
];

/// Listed but not readable as text.
const VIEWABLE_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the browser root
    pub path: String,
    pub name: String,
    pub is_dir: bool,
}

impl FileEntry {
    pub fn listing_line(&self) -> String {
        if self.is_dir {
            format!("[dir]  {}/", self.path)
        } else {
            format!("[file] {}", self.path)
        }
    }
}

pub struct FileBrowser {
    root: PathBuf,
    show_hidden: bool,
    max_read_bytes: u64,
    max_search_results: usize,
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn is_text_file(path: &Path) -> bool {
    extension(path).is_some_and(|e| TEXT_EXTENSIONS.contains(&e.as_str()))
}

fn is_allowed_file(path: &Path) -> bool {
    extension(path).is_some_and(|e| {
        TEXT_EXTENSIONS.contains(&e.as_str()) || VIEWABLE_EXTENSIONS.contains(&e.as_str())
    })
}

fn has_excluded_component(path: &Path) -> bool {
    let parts: Vec<_> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    parts.iter().any(|p| EXCLUDED_DIRS.contains(p))
        || parts.windows(2).any(|w| w == ["Library", "Keychains"])
}

impl FileBrowser {
    pub fn new(root: PathBuf, show_hidden: bool, max_read_bytes: u64, max_search_results: usize) -> Self {
        Self {
            root,
            show_hidden,
            max_read_bytes,
            max_search_results,
        }
    }

    pub fn from_config(config: &FilesConfig) -> Self {
        Self::new(
            config.root_path(),
            config.show_hidden,
            config.max_read_bytes,
            config.max_search_results,
        )
    }

    async fn canonical_root(&self) -> anyhow::Result<PathBuf> {
        tokio::fs::canonicalize(&self.root)
            .await
            .with_context(|| format!("file root {} is not accessible", self.root.display()))
    }

    /// Resolve `path` under the root, refusing anything that escapes it.
    async fn resolve(&self, path: &str) -> anyhow::Result<(PathBuf, PathBuf)> {
        if path.contains('\0') {
            bail!("path not allowed");
        }
        let lower = path.to_lowercase();
        if lower.contains("..%2f") || lower.contains("%2f..") {
            bail!("path not allowed");
        }

        let root = self.canonical_root().await?;
        let expanded = shellexpand::tilde(path.trim()).into_owned();
        let candidate = Path::new(&expanded);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            root.join(candidate)
        };

        let resolved = tokio::fs::canonicalize(&joined)
            .await
            .with_context(|| format!("no such file or directory: {path}"))?;
        if !resolved.starts_with(&root) {
            bail!("path is outside the browsable root: {path}");
        }
        let relative = resolved.strip_prefix(&root).unwrap_or(Path::new(""));
        if has_excluded_component(relative) {
            bail!("path not allowed: {path}");
        }
        Ok((root, resolved))
    }

    fn is_visible(&self, name: &str) -> bool {
        !EXCLUDED_DIRS.contains(&name) && (self.show_hidden || !name.starts_with('.'))
    }

    fn entry(root: &Path, path: &Path, is_dir: bool) -> FileEntry {
        FileEntry {
            path: path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            is_dir,
        }
    }

    /// Directory contents, directories first.
    pub async fn list(&self, path: Option<&str>) -> anyhow::Result<Vec<FileEntry>> {
        let (root, dir) = match path {
            Some(path) => self.resolve(path).await?,
            None => {
                let root = self.canonical_root().await?;
                (root.clone(), root)
            }
        };

        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("not a directory: {}", dir.display()))?;
        while let Some(item) = reader.next_entry().await? {
            let name = item.file_name().to_string_lossy().into_owned();
            if !self.is_visible(&name) {
                continue;
            }
            let file_type = item.file_type().await?;
            let item_path = item.path();
            if file_type.is_dir() {
                entries.push(Self::entry(&root, &item_path, true));
            } else if file_type.is_file() && is_allowed_file(&item_path) {
                entries.push(Self::entry(&root, &item_path, false));
            }
        }
        entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    pub async fn read(&self, path: &str) -> anyhow::Result<String> {
        let (_, file) = self.resolve(path).await?;
        if !is_text_file(&file) {
            bail!("file type not supported for reading: {path}");
        }
        let meta = tokio::fs::metadata(&file).await?;
        if !meta.is_file() {
            bail!("not a file: {path}");
        }
        if meta.len() > self.max_read_bytes {
            bail!("file too large (max {} bytes)", self.max_read_bytes);
        }
        let bytes = tokio::fs::read(&file).await?;
        String::from_utf8(bytes).with_context(|| format!("{path} is not valid UTF-8 text"))
    }

    /// Files and directories whose name contains `query` (case-insensitive).
    pub async fn search(&self, query: &str) -> anyhow::Result<Vec<FileEntry>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            bail!("search query is empty");
        }
        let root = self.canonical_root().await?;
        let mut results = Vec::new();
        let mut pending = vec![root.clone()];

        while let Some(dir) = pending.pop() {
            let Ok(mut reader) = tokio::fs::read_dir(&dir).await else {
                tracing::debug!(dir = %dir.display(), "skipping unreadable directory");
                continue;
            };
            while let Some(item) = reader.next_entry().await? {
                let name = item.file_name().to_string_lossy().into_owned();
                if !self.is_visible(&name) {
                    continue;
                }
                // file_type does not follow symlinks, so linked directories are not entered
                let file_type = item.file_type().await?;
                let item_path = item.path();
                let matches = name.to_lowercase().contains(&needle);
                if file_type.is_dir() {
                    if matches {
                        results.push(Self::entry(&root, &item_path, true));
                    }
                    pending.push(item_path);
                } else if file_type.is_file() && matches && is_allowed_file(&item_path) {
                    results.push(Self::entry(&root, &item_path, false));
                }
                if results.len() >= self.max_search_results {
                    return Ok(results);
                }
            }
        }
        results.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(results)
    }
}
