// src/spider/dispatcher.rs
// =============================================================================
// The crawl engine.
//
// How it works:
// 1. Seeds are submitted as depth-0 tasks
// 2. A fixed pool of workers pulls tasks off the shared queue
// 3. Each task is fetched and saved; if it is shallower than max_depth its
//    links are extracted and submitted one level deeper
// 4. The worker sleeps for the crawl interval and picks up the next task
// 5. `await_idle` returns once every submitted task, including everything it
//    led to, has finished
//
// Failures never propagate: a task that can't be fetched or saved is logged
// and counted as finished. Nothing is retried.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use scraper::Html;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use super::queue::{Admission, Job, TaskQueue, QUEUE_CAPACITY};
use super::task::CrawlTask;
use super::tracker::{CrawlStats, Outstanding, StatsSnapshot};
use crate::config::CrawlSettings;
use crate::error::FetchError;
use crate::page::{extract_links, Fetcher};
use crate::persist::Persister;

#[derive(Debug)]
pub struct Spider {
    settings: CrawlSettings,
    fetcher: Fetcher,
    persister: Persister,
    queue: TaskQueue,
    outstanding: Arc<Outstanding>,
    // Only present when deduplication is switched on
    visited: Option<Mutex<HashSet<String>>>,
    stats: CrawlStats,
}

impl Spider {
    pub fn new(settings: CrawlSettings) -> Result<Arc<Self>, FetchError> {
        let fetcher = Fetcher::new(settings.timeout)?;
        let persister = Persister::new(settings.output_dir.clone());
        let queue = TaskQueue::new(QUEUE_CAPACITY, settings.overflow);
        let visited = settings.dedup.then(|| Mutex::new(HashSet::new()));

        Ok(Arc::new(Self {
            settings,
            fetcher,
            persister,
            queue,
            outstanding: Outstanding::new(),
            visited,
            stats: CrawlStats::default(),
        }))
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn pending(&self) -> usize {
        self.outstanding.pending()
    }

    // Registers the task as outstanding work and hands it to the queue.
    // Never waits; returns false if the task was skipped or dropped.
    pub fn submit(&self, task: CrawlTask) -> bool {
        if !self.first_visit(&task.url) {
            debug!(url = %task.url, depth = task.depth, "already submitted, skipping");
            CrawlStats::bump(&self.stats.skipped);
            return false;
        }

        let ticket = self.outstanding.ticket();
        let url = task.url.clone();

        match self.queue.push(Job { task, ticket }) {
            Admission::Queued => true,
            Admission::Backlogged => {
                debug!(url = %url, backlog = self.queue.backlog_len(), "queue full, task parked");
                true
            }
            Admission::Dropped => {
                warn!(url = %url, "queue full, task dropped");
                CrawlStats::bump(&self.stats.skipped);
                false
            }
        }
    }

    // Starts `workers` workers. They loop forever; the runtime shutting down
    // is what stops them.
    pub fn run(self: &Arc<Self>, workers: usize) -> Vec<JoinHandle<()>> {
        (0..workers)
            .map(|id| {
                let spider = Arc::clone(self);
                tokio::spawn(async move { spider.work(id).await })
            })
            .collect()
    }

    pub async fn await_idle(&self) {
        self.outstanding.wait_idle().await;
    }

    async fn work(&self, id: usize) {
        debug!(worker = id, "worker started");

        loop {
            self.queue.refill();
            let Some(Job { task, ticket }) = self.queue.pop().await else {
                break;
            };

            self.process(&task).await;
            // Children were submitted inside process(), so they are already
            // counted when this ticket is released.
            drop(ticket);
            self.queue.refill();

            if !self.settings.interval.is_zero() {
                tokio::time::sleep(self.settings.interval).await;
            }
        }

        debug!(worker = id, "worker stopped");
    }

    pub async fn process(&self, task: &CrawlTask) {
        info!(url = %task.url, depth = task.depth, "crawl started");

        let content = match self.fetcher.fetch(&task.url).await {
            Ok(content) => content,
            Err(e) => {
                warn!(url = %task.url, depth = task.depth, error = %e, "fetch failed");
                CrawlStats::bump(&self.stats.failed);
                return;
            }
        };
        CrawlStats::bump(&self.stats.fetched);

        if let Err(e) = self.persister.persist(task, &content).await {
            warn!(url = %task.url, depth = task.depth, error = %e, "saving page failed");
            return;
        }
        CrawlStats::bump(&self.stats.saved);

        if task.depth < self.settings.max_depth {
            self.expand(task, &content);
        }
    }

    fn expand(&self, task: &CrawlTask, content: &str) {
        let document = Html::parse_document(content);
        if !document.errors.is_empty() {
            debug!(url = %task.url, errors = document.errors.len(), "page has markup errors");
        }

        let links = extract_links(document.root_element(), &task.url, &self.settings.target);
        let found = links.len();

        let submitted = links
            .into_iter()
            .map(|link| self.submit(task.child(link)))
            .filter(|&accepted| accepted)
            .count();

        CrawlStats::add(&self.stats.discovered, found);
        info!(url = %task.url, depth = task.depth, found, submitted, "page expanded");
    }

    fn first_visit(&self, url: &str) -> bool {
        let Some(visited) = &self.visited else {
            return true;
        };

        let mut visited = visited.lock().unwrap_or_else(PoisonError::into_inner);
        visited.insert(normalize(url))
    }
}

// Key used by the visited set: the parsed URL without its fragment, so
// "page.html#top" and "page.html" count as the same page.
fn normalize(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.trim().to_string(),
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why Arc<Spider>?
//    - Every worker is a separate tokio task that needs the same queue,
//      fetcher and counter
//    - `run` takes `self: &Arc<Self>` and hands each worker its own clone
//
// 2. Where does the count go down?
//    - Nowhere in this file. The Ticket inside each Job does it when dropped
//    - `work` drops it explicitly after `process` so the order is visible
//    - A job dropped by the queue (Overflow::Drop) releases its ticket too
//
// 3. Why is `expand` not async?
//    - scraper's Html is not Send, so it must never live across an .await
//      inside a spawned task. Keeping parsing in a sync fn guarantees that
//
// 4. Duplicates
//    - Without `dedupUrls` the same URL can be fetched many times when pages
//      link to each other. Depth still bounds the crawl, so it always ends
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::url_to_filename;
    use crate::spider::Overflow;
    use regex::Regex;
    use std::path::Path;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(output: &Path, max_depth: u32) -> CrawlSettings {
        CrawlSettings {
            output_dir: output.to_path_buf(),
            max_depth,
            interval: Duration::ZERO,
            timeout: Duration::from_secs(5),
            target: Regex::new(r".*\.(htm|html)$").unwrap(),
            workers: 4,
            dedup: false,
            overflow: Overflow::Backlog,
        }
    }

    async fn crawl(spider: &Arc<Spider>, seeds: Vec<CrawlTask>) {
        let workers = spider.run(spider.settings().workers);
        for seed in seeds {
            spider.submit(seed);
        }
        tokio::time::timeout(Duration::from_secs(10), spider.await_idle())
            .await
            .expect("crawl finished");
        for worker in workers {
            worker.abort();
        }
    }

    fn html_page(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html; charset=utf-8")
            .set_body_string(format!("<html><body>{body}</body></html>"))
    }

    fn saved_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_level_crawl_saves_both_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html_page(r#"<a href="page2.html">two</a>"#))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page2.html"))
            .respond_with(html_page(r#"<a href="page3.html">three</a>"#))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let spider = Spider::new(settings(dir.path(), 1)).unwrap();
        let seed = format!("{}/", server.uri());
        crawl(&spider, vec![CrawlTask::seed(seed.clone())]).await;

        assert_eq!(saved_files(dir.path()), 2);
        assert!(dir.path().join(url_to_filename(&seed)).exists());
        assert!(dir
            .path()
            .join(url_to_filename(&format!("{}/page2.html", server.uri())))
            .exists());
        assert_eq!(spider.pending(), 0);

        let stats = spider.stats();
        assert_eq!(stats.fetched, 2);
        assert_eq!(stats.saved, 2);
        assert_eq!(stats.discovered, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_max_depth_zero_fetches_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html_page(r#"<a href="page2.html">two</a>"#))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page2.html"))
            .respond_with(html_page("leaf"))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let spider = Spider::new(settings(dir.path(), 0)).unwrap();
        crawl(&spider, vec![CrawlTask::seed(format!("{}/", server.uri()))]).await;

        assert_eq!(saved_files(dir.path()), 1);
        assert_eq!(spider.stats().discovered, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timeout_drops_task_without_expansion() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                html_page(r#"<a href="page2.html">two</a>"#).set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page2.html"))
            .respond_with(html_page("leaf"))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut slow = settings(dir.path(), 3);
        slow.timeout = Duration::from_millis(200);
        let spider = Spider::new(slow).unwrap();
        crawl(&spider, vec![CrawlTask::seed(format!("{}/", server.uri()))]).await;

        assert_eq!(saved_files(dir.path()), 0);
        assert_eq!(spider.pending(), 0);
        assert_eq!(spider.stats().failed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unreachable_seed_still_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let spider = Spider::new(settings(dir.path(), 1)).unwrap();
        crawl(
            &spider,
            vec![
                CrawlTask::seed("www.baidu123.com".to_string()),
                CrawlTask::seed("http://127.0.0.1:1/index.html".to_string()),
            ],
        )
        .await;

        assert_eq!(saved_files(dir.path()), 0);
        assert_eq!(spider.stats().failed, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_save_failure_stops_expansion() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html_page(r#"<a href="page2.html">two</a>"#))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page2.html"))
            .respond_with(html_page("leaf"))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let spider = Spider::new(settings(&dir.path().join("missing"), 1)).unwrap();
        crawl(&spider, vec![CrawlTask::seed(format!("{}/", server.uri()))]).await;

        let stats = spider.stats();
        assert_eq!(stats.fetched, 1);
        assert_eq!(stats.saved, 0);
        assert_eq!(spider.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_revisits_without_dedup() {
        let server = MockServer::start().await;
        // Every page links back to itself and to the other page.
        Mock::given(method("GET"))
            .and(path("/a.html"))
            .respond_with(html_page(r#"<a href="a.html">a</a><a href="b.html">b</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b.html"))
            .respond_with(html_page(r#"<a href="a.html">a</a><a href="b.html">b</a>"#))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let spider = Spider::new(settings(dir.path(), 2)).unwrap();
        crawl(&spider, vec![CrawlTask::seed(format!("{}/a.html", server.uri()))]).await;

        // depth 0: a, depth 1: a b, depth 2: a b a b
        assert_eq!(spider.stats().fetched, 7);
        assert_eq!(saved_files(dir.path()), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_dedup_visits_each_page_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.html"))
            .respond_with(html_page(
                r#"<a href="a.html">a</a><a href="b.html">b</a><a href="b.html">b</a>"#,
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b.html"))
            .respond_with(html_page(r#"<a href="a.html">a</a>"#))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut dedup = settings(dir.path(), 5);
        dedup.dedup = true;
        let spider = Spider::new(dedup).unwrap();
        crawl(&spider, vec![CrawlTask::seed(format!("{}/a.html", server.uri()))]).await;

        let stats = spider.stats();
        assert_eq!(stats.fetched, 2);
        assert_eq!(stats.skipped, 3);
    }

    #[test]
    fn test_normalize_strips_fragment() {
        assert_eq!(
            normalize("http://localhost/page.html#section"),
            "http://localhost/page.html"
        );
        assert_eq!(normalize("not a url"), "not a url");
    }
}
