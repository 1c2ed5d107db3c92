use std::path::PathBuf;

use crate::auth::{AuthProvider, FixedCredentialAuth, HttpAuthClient};
use crate::storage::FileStore;

pub const DATA_DIR_ENV: &str = "STUDYUST_DATA_DIR";
pub const API_URL_ENV: &str = "STUDYUST_API_URL";
pub const LOG_ENV: &str = "STUDYUST_LOG";

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `study-data.json` and the session files.
    pub data_dir: PathBuf,
    /// Authentication backend; the built-in demo account when unset.
    pub api_url: Option<String>,
    /// `tracing` filter directive, e.g. `studyust=debug`.
    pub log_filter: String,
}

impl Config {
    /// The data directory is determined in the following order:
    /// 1. `STUDYUST_DATA_DIR` environment variable.
    /// 2. `~/.local/share/studyust` (on Linux).
    /// 3. `./.studyust` (fallback).
    pub fn from_env() -> Self {
        let data_dir = std::env::var(DATA_DIR_ENV).map(PathBuf::from).unwrap_or_else(|_| {
            match dirs::data_local_dir() {
                Some(mut p) => {
                    p.push("studyust");
                    p
                }
                None => PathBuf::from(".studyust"),
            }
        });
        let api_url = std::env::var(API_URL_ENV).ok().filter(|u| !u.trim().is_empty());
        let log_filter = std::env::var(LOG_ENV).unwrap_or_else(|_| "warn".to_string());
        Config { data_dir, api_url, log_filter }
    }

    pub fn file_store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("studyust.log")
    }

    pub fn auth_provider(&self) -> Box<dyn AuthProvider> {
        match &self.api_url {
            Some(url) => Box::new(HttpAuthClient::new(url.clone())),
            None => Box::new(FixedCredentialAuth::default()),
        }
    }
}
