// This is an internal crate, so we're the only consumers of
// traits with async fns for now.
#![expect(async_fn_in_trait)]
#![allow(dead_code)]

pub mod budget; // spend tracking against total/daily caps
pub mod cache; // TTL-bounded result caching
pub mod config_parser; // pricegate config file
pub mod endpoints; // API endpoints
pub mod error; // error handling
pub mod gateway_util; // utilities for gateway
pub mod observability; // utilities for observability (logs, etc.)
pub mod pricing; // price records, scraping orchestration, comparison
pub mod rate_limit; // rate limiting
pub mod scrape; // extract API client
