pub mod catalog;
pub mod config;
pub mod constants;
pub mod domain;
pub mod engine;
pub mod error;
pub mod observability;
pub mod server;

pub use catalog::{Catalog, CatalogHandle};
pub use domain::{FundingProgram, FundingQuery, FundingRequest};
pub use engine::{find_best_funding, MatchOptions, MatchOutcome};
pub use error::{CatalogError, MatchError};
