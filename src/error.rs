// src/error.rs
// =============================================================================
// Typed errors for every stage of a crawl.
//
// Only config and seed errors are fatal, and only at startup. Everything else
// is task-local: the dispatcher logs it and moves on. main.rs wraps all of
// these in anyhow with extra context.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid targetUrl pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("seed file {path} is not a JSON array of strings: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("timed out after {after:?} fetching {url}")]
    Timeout { url: String, after: Duration },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot parse base url {base:?}: {source}")]
    Base {
        base: String,
        source: url::ParseError,
    },

    #[error("base url {0:?} contains whitespace or control characters")]
    IllegalBase(String),

    #[error("cannot resolve {reference:?} against {base}: {source}")]
    Reference {
        reference: String,
        base: String,
        source: url::ParseError,
    },
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to remove stale file {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
