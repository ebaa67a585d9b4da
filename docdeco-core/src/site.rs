use std::io::Write;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::contract::PageStore;
use crate::error::DecorateError;

/// Where the rendered site lives and which of its files are pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub site_dir: PathBuf,
    /// Write decorated pages here instead of back into `site_dir`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Regexes matched against the `/`-separated relative page path.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    vec!["html".to_string(), "htm".to_string()]
}

impl SiteConfig {
    pub fn new(site_dir: impl Into<PathBuf>) -> Self {
        Self {
            site_dir: site_dir.into(),
            output_dir: None,
            extensions: default_extensions(),
            exclude: Vec::new(),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            site_dir = %self.site_dir.display(),
            output_dir = ?self.output_dir,
            exclude_count = self.exclude.len(),
            "Loaded SiteConfig"
        );
    }
}

/// A [`PageStore`] over a rendered site directory on disk.
pub struct FsPageStore {
    config: SiteConfig,
    exclude: Vec<Regex>,
}

impl FsPageStore {
    pub fn new(config: SiteConfig) -> Result<Self, DecorateError> {
        let exclude = config
            .exclude
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| DecorateError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { config, exclude })
    }

    fn is_page(&self, relative: &Path) -> bool {
        let has_extension = relative
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(ext))
            });
        if !has_extension {
            return false;
        }

        let key = slash_path(relative);
        match self.exclude.iter().find(|re| re.is_match(&key)) {
            Some(re) => {
                debug!(page = %key, pattern = %re, "Page excluded");
                false
            }
            None => true,
        }
    }

    fn output_root(&self) -> &Path {
        self.config
            .output_dir
            .as_deref()
            .unwrap_or(&self.config.site_dir)
    }
}

#[async_trait::async_trait]
impl PageStore for FsPageStore {
    async fn list_pages(&self) -> Result<Vec<PathBuf>, DecorateError> {
        let root = &self.config.site_dir;
        info!(site_dir = %root.display(), "Scanning site for pages");

        let mut pages = Vec::new();
        let mut pending = vec![root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(DecorateError::io(&dir))?;
            while let Some(entry) = entries.next_entry().await.map_err(DecorateError::io(&dir))? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(DecorateError::io(&path))?;
                let hidden = entry.file_name().to_string_lossy().starts_with('.');

                if file_type.is_dir() {
                    if hidden {
                        debug!(path = %path.display(), "Skipping hidden directory");
                    } else {
                        pending.push(path);
                    }
                } else if file_type.is_file() && !hidden {
                    let Ok(relative) = path.strip_prefix(root) else {
                        continue;
                    };
                    if self.is_page(relative) {
                        pages.push(relative.to_path_buf());
                    }
                }
            }
        }

        pages.sort();
        info!(count = pages.len(), "Completed page discovery");
        Ok(pages)
    }

    async fn read_page(&self, page: &Path) -> Result<String, DecorateError> {
        let path = self.config.site_dir.join(checked(page)?);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to read page");
            DecorateError::Io {
                path: path.clone(),
                source: e,
            }
        })?;
        String::from_utf8(bytes).map_err(|_| DecorateError::Encoding(path))
    }

    async fn write_page(&self, page: &Path, html: &str) -> Result<(), DecorateError> {
        let target = self.output_root().join(checked(page)?);
        let parent = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.output_root().to_path_buf());
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(DecorateError::io(&parent))?;

        // Write through a temp file in the same directory so readers never see
        // a half-written page.
        let html = html.to_owned();
        let written = target.clone();
        tokio::task::spawn_blocking(move || -> Result<(), DecorateError> {
            let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(DecorateError::io(&parent))?;
            tmp.write_all(html.as_bytes())
                .map_err(DecorateError::io(tmp.path()))?;
            tmp.persist(&target).map_err(|e| DecorateError::Io {
                path: target.clone(),
                source: e.error,
            })?;
            Ok(())
        })
        .await
        .map_err(|e| DecorateError::Task(e.to_string()))??;

        debug!(path = %written.display(), "Page written");
        Ok(())
    }
}

/// Reject page paths that would escape the site root.
fn checked(page: &Path) -> Result<&Path, DecorateError> {
    let escapes = page
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(DecorateError::Io {
            path: page.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "page path must stay inside the site directory",
            ),
        });
    }
    Ok(page)
}

fn slash_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_page_filters_extension_and_exclude() {
        let mut config = SiteConfig::new("/site");
        config.exclude = vec![r"^assets/".to_string(), r"^404\.html$".to_string()];
        let store = FsPageStore::new(config).unwrap();

        assert!(store.is_page(Path::new("index.html")));
        assert!(store.is_page(Path::new("guide/INSTALL.HTM")));
        assert!(!store.is_page(Path::new("404.html")));
        assert!(!store.is_page(Path::new("assets/js/tome.html")));
        assert!(!store.is_page(Path::new("sitemap.xml")));
        assert!(!store.is_page(Path::new("README")));
    }

    #[test]
    fn test_invalid_exclude_pattern_is_rejected() {
        let mut config = SiteConfig::new("/site");
        config.exclude = vec!["(".to_string()];
        assert!(matches!(
            FsPageStore::new(config),
            Err(DecorateError::Pattern { .. })
        ));
    }

    #[test]
    fn test_checked_rejects_parent_components() {
        assert!(checked(Path::new("guide/index.html")).is_ok());
        assert!(checked(Path::new("../outside.html")).is_err());
        assert!(checked(Path::new("/etc/passwd")).is_err());
    }
}
