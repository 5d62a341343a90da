//! Service boundary: request/response bodies and endpoint handlers
//!
//! Error bodies always carry a fallback schema. Statuses follow the error
//! kind: bad requests are 400, upstream gateway failures 503, the rest 500.

mod handlers;
mod types;

pub use handlers::{handle_crawl, handle_infer, request_options, run_crawl};
pub use types::{
    ApiError, CrawlRequest, CrawlResponse, ErrorResponse, InferQuery, InferResponse,
};
