// src/spider/mod.rs
// =============================================================================
// The concurrent crawl engine.
//
// Submodules:
// - task: the CrawlTask value type
// - tracker: outstanding-work counter, tickets and crawl statistics
// - queue: bounded task queue with an explicit overflow policy
// - dispatcher: the Spider itself (submit, run, process, await_idle)
// =============================================================================

mod dispatcher;
mod queue;
mod task;
mod tracker;

pub use dispatcher::Spider;
pub use queue::Overflow;
pub use task::CrawlTask;
