//! Raw stats loading for the render path.
//!
//! The renderer never talks to the network: raw per-account records come from
//! a `StatsSource` the caller injects. The stock implementation reads the
//! shared local cache file produced by `statcards fetch`.

use crate::model::UserStats;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default cache file name, resolved against the working directory.
pub const CACHE_FILE: &str = "github-user-stats.json";

/// Errors raised while loading raw stats records.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(
        "could not find local stats file at {path}; run `statcards fetch --username <name>` first"
    )]
    MissingCache { path: PathBuf },

    #[error("failed to read stats file at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed stats file at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Supplies one raw `UserStats` record per requested account, in input order.
///
/// Either every identifier gets a record or the load fails as a whole; there
/// are no partial results.
pub trait StatsSource {
    fn load(&self, usernames: &[String]) -> Result<Vec<UserStats>, LoadError>;
}

/// Reads the single shared cache file written by the fetch subcommand.
///
/// The cache holds one record, parsed once and cloned for every requested
/// username. Real per-account records would need one cache entry per account;
/// until the fetch side grows that, every account sees the same data.
pub struct FileCacheSource {
    path: PathBuf,
}

impl FileCacheSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache at the conventional name inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(CACHE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsSource for FileCacheSource {
    fn load(&self, usernames: &[String]) -> Result<Vec<UserStats>, LoadError> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        if !self.path.exists() {
            return Err(LoadError::MissingCache {
                path: self.path.clone(),
            });
        }

        let data = fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        let record: UserStats =
            serde_json::from_str(&data).map_err(|source| LoadError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        let mut stats = Vec::with_capacity(usernames.len());
        for username in usernames {
            info!("loading local stats for {username}");
            stats.push(record.clone());
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_usernames_yield_empty_list_without_touching_the_file() {
        let source = FileCacheSource::new("/definitely/not/here.json");
        let stats = source.load(&[]).unwrap();
        assert!(stats.is_empty());
    }

    #[test]
    fn missing_cache_error_names_the_resolved_path() {
        let source = FileCacheSource::new("/definitely/not/here.json");
        let err = source.load(&["alice".to_string()]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("/definitely/not/here.json"));
        assert!(msg.contains("statcards fetch"));
    }
}
