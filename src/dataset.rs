//! Dataset acquisition: handle → local directory → label file.
//!
//! Resolution order for a handle `owner/slug`:
//!
//! 1. an explicit data root, when configured (no fallthrough if it is missing);
//! 2. the kagglehub cache, `~/.cache/kagglehub/datasets/<owner>/<slug>`, taking
//!    the highest `versions/<n>` directory when present;
//! 3. this crate's cache, `<cache_dir>/biasgrid/datasets/<owner>/<slug>`;
//! 4. a one-shot download of the `y_*.npy` files into (3) (feature `download`).
//!
//! Every failure is [`Error::Acquisition`]; nothing is retried.

use std::fmt;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Dataset identifier of the form `owner/slug`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetHandle {
    owner: String,
    slug: String,
}

impl DatasetHandle {
    pub fn parse(handle: &str) -> Result<Self> {
        let mut parts = handle.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(slug), None)
                if is_segment(owner) && is_segment(slug) =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    slug: slug.to_string(),
                })
            }
            _ => Err(Error::acquisition(format!(
                "dataset handle {handle:?} is not of the form owner/slug"
            ))),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    fn relative_dir(&self) -> PathBuf {
        Path::new("datasets").join(&self.owner).join(&self.slug)
    }
}

impl fmt::Display for DatasetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.slug)
    }
}

fn is_segment(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains('\\')
}

/// True for file names following the `y_*.npy` label convention.
pub fn is_label_file_name(name: &str) -> bool {
    name.starts_with("y_") && name.ends_with(".npy")
}

/// Where to look for (and put) datasets.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetLocator {
    /// Use this directory directly instead of any cache.
    pub data_root: Option<PathBuf>,
    /// Root of the kagglehub cache (normally `~/.cache/kagglehub`).
    pub kagglehub_cache: Option<PathBuf>,
    /// Root of this crate's own cache.
    pub cache_dir: Option<PathBuf>,
    /// Permit the one-shot download when nothing is cached.
    pub allow_download: bool,
}

impl Default for DatasetLocator {
    fn default() -> Self {
        Self {
            data_root: None,
            kagglehub_cache: dirs::home_dir().map(|h| h.join(".cache").join("kagglehub")),
            cache_dir: dirs::cache_dir().map(|c| c.join("biasgrid")),
            allow_download: true,
        }
    }
}

impl DatasetLocator {
    /// Locator that only ever looks at `root`.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: Some(root.into()),
            kagglehub_cache: None,
            cache_dir: None,
            allow_download: false,
        }
    }

    /// Resolve a handle to a local directory.
    pub fn resolve(&self, handle: &DatasetHandle) -> Result<PathBuf> {
        if let Some(root) = &self.data_root {
            if root.is_dir() {
                debug!(root = %root.display(), "using configured data root");
                return Ok(root.clone());
            }
            return Err(Error::acquisition(format!(
                "configured data root {} is not a directory",
                root.display()
            )));
        }

        if let Some(dir) = self
            .kagglehub_cache
            .as_deref()
            .and_then(|cache| kagglehub_dataset_dir(cache, handle))
        {
            info!(dataset = %handle, path = %dir.display(), "found kagglehub cache");
            return Ok(dir);
        }

        let own = self
            .cache_dir
            .as_ref()
            .map(|c| c.join(handle.relative_dir()));
        if let Some(dir) = &own {
            if !find_label_files(dir).is_empty() {
                info!(dataset = %handle, path = %dir.display(), "found cached dataset");
                return Ok(dir.clone());
            }
        }

        if !self.allow_download {
            return Err(Error::acquisition(format!(
                "dataset {handle} is not cached and downloads are disabled"
            )));
        }
        let dest = own.ok_or_else(|| {
            Error::acquisition("no cache directory available to download into")
        })?;
        download(handle, &dest)
    }
}

/// Highest-version directory of `handle` inside a kagglehub cache root.
fn kagglehub_dataset_dir(cache: &Path, handle: &DatasetHandle) -> Option<PathBuf> {
    let base = cache.join(handle.relative_dir());
    let versions = base.join("versions");
    if let Ok(entries) = std::fs::read_dir(&versions) {
        let best = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| {
                let n = e.file_name().to_str()?.parse::<u64>().ok()?;
                Some((n, e.path()))
            })
            .max_by_key(|(n, _)| *n);
        if let Some((_, path)) = best {
            return Some(path);
        }
    }
    base.is_dir().then_some(base)
}

/// All `y_*.npy` files under `root`, sorted by path.
pub fn find_label_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_str().is_some_and(is_label_file_name))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Pick the label file to load.
///
/// A file named `preferred` wins (first in path order); otherwise one `y_*.npy`
/// file is chosen uniformly with `rng`.
pub fn select_label_file<R: Rng + ?Sized>(
    root: &Path,
    preferred: Option<&str>,
    rng: &mut R,
) -> Result<PathBuf> {
    let files = find_label_files(root);
    if let Some(name) = preferred {
        if let Some(hit) = files
            .iter()
            .find(|p| p.file_name().and_then(|n| n.to_str()) == Some(name))
        {
            return Ok(hit.clone());
        }
        debug!(preferred = name, candidates = files.len(), "preferred label file not found");
    }
    files.choose(rng).cloned().ok_or_else(|| {
        Error::acquisition(format!("no y_*.npy label file under {}", root.display()))
    })
}

#[cfg(feature = "download")]
fn download(handle: &DatasetHandle, dest: &Path) -> Result<PathBuf> {
    kaggle::download_label_files(handle, dest)?;
    Ok(dest.to_path_buf())
}

#[cfg(not(feature = "download"))]
fn download(handle: &DatasetHandle, _dest: &Path) -> Result<PathBuf> {
    Err(Error::acquisition(format!(
        "dataset {handle} is not cached and this build has no download support"
    )))
}

#[cfg(feature = "download")]
mod kaggle {
    use std::io::Read;
    use std::path::Path;

    use serde::Deserialize;
    use tracing::{info, warn};

    use super::{is_label_file_name, DatasetHandle};
    use crate::error::{Error, Result};

    const API_BASE: &str = "https://www.kaggle.com/api/v1";
    /// Per-file download ceiling.
    const MAX_FILE_BYTES: u64 = 256 * 1024 * 1024;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct FileList {
        #[serde(default)]
        dataset_files: Vec<FileEntry>,
        #[serde(default)]
        error_message: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct FileEntry {
        name: String,
    }

    fn get(url: &str) -> Result<ureq::Response> {
        match ureq::get(url).call() {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(code, _)) => {
                Err(Error::acquisition(format!("GET {url}: HTTP {code}")))
            }
            Err(e) => Err(Error::acquisition(format!("GET {url}: {e}"))),
        }
    }

    /// Fetch every `y_*.npy` file of `handle` into `dest`, keeping relative paths.
    pub(super) fn download_label_files(handle: &DatasetHandle, dest: &Path) -> Result<usize> {
        let list_url = format!("{API_BASE}/datasets/list/{}/{}", handle.owner(), handle.slug());
        info!(dataset = %handle, "downloading file list");
        let list: FileList = get(&list_url)?
            .into_json()
            .map_err(|e| Error::acquisition(format!("decode file list: {e}")))?;
        if let Some(msg) = list.error_message.filter(|m| !m.is_empty()) {
            return Err(Error::acquisition(format!("kaggle: {msg}")));
        }

        let wanted: Vec<&str> = list
            .dataset_files
            .iter()
            .map(|f| f.name.as_str())
            .filter(|name| {
                Path::new(name)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_label_file_name)
            })
            .collect();
        if wanted.is_empty() {
            return Err(Error::acquisition(format!(
                "dataset {handle} lists no y_*.npy files"
            )));
        }

        let mut written = 0usize;
        for name in wanted {
            if name.split('/').any(|seg| seg == ".." || seg.is_empty()) {
                warn!(file = name, "skipping suspicious file name");
                continue;
            }
            let url = format!(
                "{API_BASE}/datasets/download/{}/{}/{}",
                handle.owner(),
                handle.slug(),
                name.replace(' ', "%20")
            );
            let mut body = Vec::new();
            get(&url)?
                .into_reader()
                .take(MAX_FILE_BYTES)
                .read_to_end(&mut body)
                .map_err(|e| Error::acquisition(format!("read {name}: {e}")))?;

            let target = dest.join(name);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::acquisition(format!("create {}: {e}", parent.display()))
                })?;
            }
            std::fs::write(&target, &body)
                .map_err(|e| Error::acquisition(format!("write {}: {e}", target.display())))?;
            info!(file = name, bytes = body.len(), "downloaded");
            written += 1;
        }
        if written == 0 {
            return Err(Error::acquisition(format!(
                "dataset {handle}: no label file could be downloaded"
            )));
        }
        Ok(written)
    }
}
