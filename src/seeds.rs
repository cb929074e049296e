// src/seeds.rs
// =============================================================================
// Reads the seed list: a JSON array of URL strings, e.g.
//
//   ["http://www.baidu.com", "http://www.sina.com.cn"]
//
// Every seed becomes a depth-0 CrawlTask, in file order.
// =============================================================================

use std::path::Path;

use crate::error::SeedError;
use crate::spider::CrawlTask;

// Parameters:
//   path: the seed file (urlListFile in the config)
//
// Returns: one depth-0 task per URL, or a SeedError if the file is missing
// or is not a JSON array of strings
pub async fn load_seeds(path: &Path) -> Result<Vec<CrawlTask>, SeedError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| SeedError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let urls: Vec<String> = serde_json::from_slice(&bytes).map_err(|source| SeedError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(urls.into_iter().map(CrawlTask::seed).collect())
}
