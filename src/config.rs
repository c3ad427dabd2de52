use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_QUERY: &str = "redux";
pub const DEFAULT_HPP: u32 = 100;
pub const PATH_BASE: &str = "https://hn.algolia.com/api/v1";
pub const PATH_SEARCH: &str = "/search";

#[derive(Parser, Debug)]
#[command(name = "hn-search")]
#[command(about = "Search Hacker News from the terminal", long_about = None)]
pub struct Cli {
    /// Query submitted on startup
    #[arg(short, long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Hits requested per page
    #[arg(
        long,
        default_value_t = DEFAULT_HPP,
        value_parser = clap::value_parser!(u32).range(1..=1000)
    )]
    pub hits_per_page: u32,

    /// Base URL of the search API
    #[arg(long, env = "HN_SEARCH_BASE_URL", default_value = PATH_BASE)]
    pub base_url: String,

    /// Write logs to this file (the terminal is taken by the UI)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            base_url: self.base_url.clone(),
            search_path: PATH_SEARCH.to_string(),
            default_query: self.query.clone(),
            hits_per_page: self.hits_per_page,
        }
    }

    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "hn_search=debug"
        } else {
            "hn_search=info"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub base_url: String,
    pub search_path: String,
    pub default_query: String,
    pub hits_per_page: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: PATH_BASE.to_string(),
            search_path: PATH_SEARCH.to_string(),
            default_query: DEFAULT_QUERY.to_string(),
            hits_per_page: DEFAULT_HPP,
        }
    }
}

impl SearchConfig {
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.search_path)
    }
}
