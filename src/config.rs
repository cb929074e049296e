// src/config.rs
// =============================================================================
// Loading and validating the spider configuration.
//
// The config file is JSON with a single "spider" section:
//
//   {
//     "spider": {
//       "urlListFile": "./data/url.data",
//       "outputDirectory": "./output",
//       "maxDepth": 1,
//       "crawlInterval": 1,
//       "crawlTimeout": 1,
//       "targetUrl": ".*\\.(htm|html)$",
//       "threadCount": 8
//     }
//   }
//
// SpiderConfig mirrors the file. CrawlSettings is the read-only context the
// Spider is built from: durations instead of seconds and a compiled pattern.
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::spider::Overflow;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub spider: SpiderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpiderConfig {
    /// JSON file holding the seed URLs
    pub url_list_file: PathBuf,
    /// Where fetched pages are written
    pub output_directory: PathBuf,
    /// Seeds are depth 0; pages at this depth are saved but not expanded
    pub max_depth: u32,
    /// Seconds a worker pauses after each task
    pub crawl_interval: u64,
    /// Seconds allowed for connect + full response
    pub crawl_timeout: u64,
    /// Regular expression a link must match to be followed
    pub target_url: String,
    /// Number of workers
    pub thread_count: usize,
    /// Skip URLs that were already submitted during this run
    #[serde(default)]
    pub dedup_urls: bool,
    /// What to do with a task when the queue is full
    #[serde(default)]
    pub queue_overflow: Overflow,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.spider.validate()?;
        Ok(config)
    }
}

impl SpiderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url_list_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("urlListFile must not be empty".into()));
        }
        if self.output_directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("outputDirectory must not be empty".into()));
        }
        if self.thread_count == 0 {
            return Err(ConfigError::Invalid("threadCount must be at least 1".into()));
        }
        if self.crawl_timeout == 0 {
            return Err(ConfigError::Invalid("crawlTimeout must be at least 1 second".into()));
        }

        compile_pattern(&self.target_url).map(|_| ())
    }
}

/// Everything the Spider needs, built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub output_dir: PathBuf,
    pub max_depth: u32,
    pub interval: Duration,
    pub timeout: Duration,
    pub target: Regex,
    pub workers: usize,
    pub dedup: bool,
    pub overflow: Overflow,
}

impl CrawlSettings {
    pub fn from_config(config: &SpiderConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            output_dir: config.output_directory.clone(),
            max_depth: config.max_depth,
            interval: Duration::from_secs(config.crawl_interval),
            timeout: Duration::from_secs(config.crawl_timeout),
            target: compile_pattern(&config.target_url)?,
            workers: config.thread_count,
            dedup: config.dedup_urls,
            overflow: config.queue_overflow,
        })
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}
