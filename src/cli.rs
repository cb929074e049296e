// src/cli.rs
// =============================================================================
// Command-line interface.
//
//   mini-spider                          # uses ./conf/spider.json
//   mini-spider -c conf/other.json -v    # another config, debug logging
//   mini-spider --log-file ./log/spider.log
//
// Everything about the crawl itself lives in the config file; the flags only
// say where that file is and where logs go.
// =============================================================================

use clap::{Parser, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mini-spider",
    version,
    about = "Crawl seed pages and save every linked page that matches a URL pattern",
    long_about = "mini-spider reads a list of seed URLs, follows links up to a configured depth \
                  with a pool of concurrent workers, and saves pages whose links match the \
                  configured pattern into the output directory."
)]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(short = 'c', long, default_value = "./conf/spider.json", value_hint = ValueHint::FilePath)]
    pub config: PathBuf,

    /// Write logs to this file instead of stderr
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides this)
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["mini-spider"]);
        assert_eq!(cli.config, PathBuf::from("./conf/spider.json"));
        assert!(cli.log_file.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["mini-spider", "-c", "conf/x.json", "-v", "--log-file", "log/s.log"]);
        assert_eq!(cli.config, PathBuf::from("conf/x.json"));
        assert_eq!(cli.log_file, Some(PathBuf::from("log/s.log")));
        assert!(cli.verbose);
    }
}
