// src/page/mod.rs
// =============================================================================
// Everything that happens to a single page:
// - fetch: download it with a deadline
// - charset: turn the body into UTF-8
// - links: pull out the links worth following
// - resolve: make those links absolute
// =============================================================================

mod charset;
mod fetch;
mod links;
mod resolve;

pub use fetch::Fetcher;
pub use links::extract_links;
