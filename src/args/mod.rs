//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::LoadArgs;
pub use types::{CredentialPlacement, HttpMethod, OutputFormat, PositiveU64, PositiveUsize};

pub use defaults::{
    DEFAULT_CONCURRENCY, DEFAULT_DELAY_SECS, DEFAULT_POOL_IDLE_TIMEOUT,
    DEFAULT_POOL_MAX_IDLE_PER_HOST, DEFAULT_REQUESTS_PER_WORKER, DEFAULT_USER_AGENT,
};
