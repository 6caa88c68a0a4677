use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::io::copy;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;

const RCSB_URL_PDB: &str = "https://files.rcsb.org/download/";

const MAX_RETRIES: u32 = 3;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Structure {0} not found")]
    NotFound(String),
    #[error("Request for {id} failed with status {status}")]
    Status { id: String, status: u16 },
    #[error("Max retries exceeded for {0}")]
    RetriesExceeded(String),
    #[error("No structure provider configured for {0}")]
    NoProvider(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of raw PDB text, keyed by PDB id
pub trait StructureProvider: Send + Sync {
    fn fetch(&self, pdb_id: &str) -> Result<String, FetchError>;
}

/// Serves structures from a local directory of `<id>.pdb` files only
#[derive(Debug, Clone)]
pub struct LocalProvider {
    dir: PathBuf,
}

impl LocalProvider {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, pdb_id: &str) -> PathBuf {
        self.dir.join(format!("{}.pdb", pdb_id))
    }
}

impl StructureProvider for LocalProvider {
    fn fetch(&self, pdb_id: &str) -> Result<String, FetchError> {
        let path = self.path_for(pdb_id);
        if !path.exists() {
            return Err(FetchError::NotFound(pdb_id.to_string()));
        }
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Downloads PDB files from the RCSB data bank into a cache directory.
///
/// A cached file is reused unconditionally; there is no staleness check.
#[derive(Debug, Clone)]
pub struct RcsbProvider {
    cache_dir: PathBuf,
    base_url: String,
    client: Client,
}

impl RcsbProvider {
    pub fn new<P: Into<PathBuf>>(cache_dir: P) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            cache_dir: cache_dir.into(),
            base_url: RCSB_URL_PDB.to_string(),
            client,
        })
    }

    /// Point at a mirror instead of files.rcsb.org
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Ids are case-insensitive; the cache file name is upper case
    pub fn cache_path(&self, pdb_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.pdb", pdb_id.to_uppercase()))
    }

    fn url_for(&self, pdb_id: &str) -> String {
        format!("{}{}.pdb", self.base_url, pdb_id.to_uppercase())
    }

    /// Download into the cache if absent and return the cached path
    pub fn ensure_cached(&self, pdb_id: &str) -> Result<PathBuf, FetchError> {
        let target_path = self.cache_path(pdb_id);
        if target_path.exists() {
            return Ok(target_path);
        }

        if !self.cache_dir.exists() {
            std::fs::create_dir_all(&self.cache_dir)?;
        }

        // Unique temporary file per download; dropped (and removed) on error
        let mut tmp = NamedTempFile::new_in(&self.cache_dir)?;
        download_to_writer(&self.client, &self.url_for(pdb_id), pdb_id, &mut tmp)?;
        persist_download(tmp, &target_path)?;
        log::debug!("Downloaded {} to {}", pdb_id, target_path.display());
        Ok(target_path)
    }
}

impl StructureProvider for RcsbProvider {
    fn fetch(&self, pdb_id: &str) -> Result<String, FetchError> {
        let path = self.ensure_cached(pdb_id)?;
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Move a finished download into place. Another worker having cached the
/// same id first counts as success.
fn persist_download(tmp: NamedTempFile, target: &Path) -> Result<(), FetchError> {
    match tmp.persist_noclobber(target) {
        Ok(_) => Ok(()),
        Err(_) if target.exists() => {
            log::debug!("{} already cached by another worker", target.display());
            Ok(())
        }
        Err(e) => Err(FetchError::Io(e.error)),
    }
}

fn fetch_with_retry(
    client: &Client,
    url: &str,
    pdb_id: &str,
) -> Result<reqwest::blocking::Response, FetchError> {
    let mut delay = Duration::from_secs(1);

    for i in 0..MAX_RETRIES {
        match client.get(url).send() {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    return Ok(resp);
                } else if status == StatusCode::NOT_FOUND {
                    return Err(FetchError::NotFound(pdb_id.to_string()));
                }
                // Only 5xx errors are retryable
                if !status.is_server_error() {
                    return Err(FetchError::Status {
                        id: pdb_id.to_string(),
                        status: status.as_u16(),
                    });
                }
                log::debug!("Server error {} for {}, retrying", status, url);
            }
            Err(e) => {
                // Network error, retry
                log::debug!("Request for {} failed: {}", url, e);
            }
        }

        if i < MAX_RETRIES - 1 {
            std::thread::sleep(delay);
            delay *= 2;
        }
    }

    Err(FetchError::RetriesExceeded(pdb_id.to_string()))
}

fn download_to_writer<W: std::io::Write>(
    client: &Client,
    url: &str,
    pdb_id: &str,
    writer: &mut W,
) -> Result<(), FetchError> {
    let mut response = fetch_with_retry(client, url, pdb_id)?;
    copy(&mut response, writer)?;
    Ok(())
}
