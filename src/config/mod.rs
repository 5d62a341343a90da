//! TOML configuration: fetcher connection, crawl tuning, and output locations
//!
//! ```no_run
//! use site_harvest::config::load_config_with_hash;
//! use std::path::Path;
//!
//! let (config, hash) = load_config_with_hash(Path::new("site-harvest.toml")).unwrap();
//! println!("{} (config {})", config.fetcher.api_url, &hash[..8]);
//! ```

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use types::{Config, CrawlConfig, FetcherConfig, OutputConfig};
