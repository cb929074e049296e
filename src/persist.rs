// src/persist.rs
// =============================================================================
// Writes fetched pages to disk under content-addressed names.
//
// The file name is derived from the URL alone:
//   1. every '/' becomes "%20F"
//   2. the result is hashed with MD5 and rendered as lowercase hex
//
// So the same URL always lands in the same file, and saving it again replaces
// the old content instead of appending to it.
// =============================================================================

use std::path::PathBuf;

use md5::{Digest, Md5};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

use crate::error::PersistError;
use crate::spider::CrawlTask;

const SLASH_MARKER: &str = "%20F";

pub fn url_to_filename(url: &str) -> String {
    let mangled = url.replace('/', SLASH_MARKER);
    hex::encode(Md5::digest(mangled.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct Persister {
    output_dir: PathBuf,
}

impl Persister {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.output_dir.join(url_to_filename(url))
    }

    // Saves `content` for `task`, replacing any earlier file for the same URL
    //
    // Parameters:
    //   task: the crawled task (only its URL picks the file)
    //   content: the page body, already UTF-8
    //
    // Returns: the path written, or a PersistError if the old file could not
    // be removed or the new one written. The output directory must exist.
    //
    // Example:
    //   url = "http://www.baidu.com/cache/sethelp/help.html"
    //   path = "<output>/93a27aab7c56d581f91841bcd4bfc83c"
    pub async fn persist(&self, task: &CrawlTask, content: &str) -> Result<PathBuf, PersistError> {
        let path = self.path_for(&task.url);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|source| PersistError::Remove {
                    path: path.clone(),
                    source,
                })?;
        }

        let write_err = |source| PersistError::Write {
            path: path.clone(),
            source,
        };

        let file = tokio::fs::File::create(&path).await.map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(content.as_bytes())
            .await
            .map_err(write_err)?;
        writer.flush().await.map_err(write_err)?;

        info!(
            url = %task.url,
            depth = task.depth,
            file = %path.display(),
            "page saved"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_to_filename() {
        let filename = url_to_filename("http://www.baidu.com/cache/sethelp/help.html");
        assert_eq!(filename, "93a27aab7c56d581f91841bcd4bfc83c");
    }

    #[test]
    fn test_filename_is_lowercase_hex() {
        let filename = url_to_filename("http://a.test/");
        assert_eq!(filename.len(), 32);
        assert!(filename
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[tokio::test]
    async fn test_persist_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let persister = Persister::new(dir.path());
        let task = CrawlTask::seed("http://www.baidu.com".to_string());

        persister.persist(&task, "first version, rather long").await.unwrap();
        let path = persister.persist(&task, "second").await.unwrap();

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_persist_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let persister = Persister::new(dir.path().join("output"));
        let task = CrawlTask::seed("http://www.baidu.com".to_string());

        let err = persister.persist(&task, "123").await.unwrap_err();
        assert!(matches!(err, PersistError::Write { .. }));
    }
}
