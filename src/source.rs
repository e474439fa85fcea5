use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use ahash::AHashMap;
use anyhow::{anyhow, bail, Context, Result};

use crate::config::LoaderConfig;

/// Read-only access to panel data files by relative path, e.g. "/data/floodplains.json".
/// A leading slash is ignored, so paths resolve against the source root.
pub trait DataSource: Send + Sync {
    fn fetch(&self, rel: &str) -> Result<Arc<[u8]>>;
    fn has(&self, rel: &str) -> bool;
}

#[inline]
fn normalize(rel: &str) -> &str { rel.trim_start_matches('/') }

/// Normalize `rel`, refusing paths that climb out of the source root.
fn checked(rel: &str) -> Result<&str> {
    let rel = normalize(rel);
    if Path::new(rel).components().any(|c| matches!(c, Component::ParentDir | Component::Prefix(_))) {
        bail!("data path escapes the source root: {rel:?}");
    }
    Ok(rel)
}

/// Data files in a local directory.
pub struct DiskSource {
    root: PathBuf,
}

impl DiskSource {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    fn full(&self, rel: &str) -> Result<PathBuf> { Ok(self.root.join(checked(rel)?)) }
}

impl DataSource for DiskSource {
    fn fetch(&self, rel: &str) -> Result<Arc<[u8]>> {
        let path = self.full(rel)?;
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Arc::from(bytes))
    }

    fn has(&self, rel: &str) -> bool { self.full(rel).is_ok_and(|path| path.is_file()) }
}

/// Data files held in memory, keyed by normalized relative path.
#[derive(Default, Clone)]
pub struct MemSource {
    files: AHashMap<String, Arc<[u8]>>,
}

impl MemSource {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, rel: &str, bytes: impl Into<Vec<u8>>) -> &mut Self {
        let bytes: Vec<u8> = bytes.into();
        self.files.insert(normalize(rel).to_string(), Arc::from(bytes));
        self
    }

    pub fn with(mut self, rel: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(rel, bytes);
        self
    }
}

impl DataSource for MemSource {
    fn fetch(&self, rel: &str) -> Result<Arc<[u8]>> {
        self.files.get(normalize(rel)).cloned()
            .ok_or_else(|| anyhow!("missing data file: {rel}"))
    }

    fn has(&self, rel: &str) -> bool { self.files.contains_key(normalize(rel)) }
}

/// Data files served over HTTP(S) below a base URL.
#[cfg(feature = "download")]
pub struct HttpSource {
    base: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "download")]
impl HttpSource {
    pub fn new(base: &str, config: &LoaderConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("atxmap/", env!("CARGO_PKG_VERSION")))
            .timeout(config.fetch_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { base: base.trim_end_matches('/').to_string(), client })
    }

    fn url(&self, rel: &str) -> Result<String> { Ok(format!("{}/{}", self.base, checked(rel)?)) }
}

#[cfg(feature = "download")]
impl DataSource for HttpSource {
    fn fetch(&self, rel: &str) -> Result<Arc<[u8]>> {
        let url = self.url(rel)?;
        let resp = self.client.get(&url).send()
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned error status"))?;
        let bytes = resp.bytes().with_context(|| format!("read body of {url}"))?;
        Ok(Arc::from(&bytes[..]))
    }

    fn has(&self, rel: &str) -> bool {
        let Ok(url) = self.url(rel) else { return false };
        self.client.head(url).send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }
}

/// Open a source for `location`: an `http(s)://` base URL or a local directory.
pub fn open_source(location: &str, config: &LoaderConfig) -> Result<Arc<dyn DataSource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        #[cfg(feature = "download")]
        return Ok(Arc::new(HttpSource::new(location, config)?));
        #[cfg(not(feature = "download"))]
        anyhow::bail!("HTTP sources need the \"download\" feature: {location}");
    }
    let _ = config;
    Ok(Arc::new(DiskSource::new(location)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_source_ignores_leading_slash() {
        let src = MemSource::new().with("/data/a.json", b"[]".to_vec());
        assert!(src.has("data/a.json"));
        assert!(src.has("/data/a.json"));
        assert_eq!(&*src.fetch("data/a.json").unwrap(), b"[]");
        assert!(src.fetch("/data/b.json").is_err());
    }

    #[test]
    fn disk_source_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/streets.json"), b"[1]").unwrap();

        let src = open_source(dir.path().to_str().unwrap(), &LoaderConfig::default()).unwrap();
        assert!(src.has("/data/streets.json"));
        assert!(!src.has("/data/missing.json"));
        assert_eq!(&*src.fetch("/data/streets.json").unwrap(), b"[1]");
        assert!(src.fetch("/data/missing.json").is_err());
    }

    #[test]
    fn disk_source_refuses_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        std::fs::create_dir_all(root.join("data")).unwrap();
        std::fs::write(dir.path().join("secret.json"), b"[]").unwrap();

        let src = DiskSource::new(root.clone());
        assert!(!src.has("/../secret.json"));
        let err = src.fetch("/data/../../secret.json").unwrap_err();
        assert!(err.to_string().contains("escapes the source root"));
    }
}
