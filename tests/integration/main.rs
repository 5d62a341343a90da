//! Integration tests for Site-Harvest
//!
//! Registered as one test target; each module covers one area end to end.

mod common;
mod config_tests;
mod crawl_tests;
mod export_tests;
mod firecrawl_tests;
mod mapping_tests;
mod storage_tests;
