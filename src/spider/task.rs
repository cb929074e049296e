// src/spider/task.rs

// One unit of crawl work: a URL and how many link hops separate it from the
// seed it was discovered from. Seeds are depth 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlTask {
    pub url: String,
    pub depth: u32,
}

impl CrawlTask {
    pub fn seed(url: String) -> Self {
        Self { url, depth: 0 }
    }

    pub fn child(&self, url: String) -> Self {
        Self {
            url,
            depth: self.depth + 1,
        }
    }
}
