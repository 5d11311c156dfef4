use clap::Parser;
use std::time::Duration;

use super::parsers::{
    parse_delay_arg, parse_duration_arg, parse_positive_u64, parse_positive_usize,
};
use super::types::{CredentialPlacement, HttpMethod, OutputFormat, PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent HTTP load generator - fixed worker pools, per-worker request streams, cooperative cancellation and throughput summaries."
)]
pub struct LoadArgs {
    /// Target URL
    #[arg(long, short)]
    pub url: Option<String>,

    /// HTTP method to use
    #[arg(long, short = 'X', default_value = "get", ignore_case = true)]
    pub method: HttpMethod,

    /// Credential (bootKey) sent with every request
    #[arg(long = "key", short = 'k', env = "LOADRUNNER_KEY")]
    pub credential: Option<String>,

    /// Where the credential travels on POST/PUT/PATCH/DELETE requests
    #[arg(long = "credential-placement", default_value = "payload", ignore_case = true)]
    pub credential_placement: CredentialPlacement,

    /// Number of concurrent workers
    #[arg(
        long,
        short = 'c',
        alias = "threads",
        default_value = "1",
        value_parser = parse_positive_usize
    )]
    pub concurrency: PositiveUsize,

    /// Requests issued by each worker
    #[arg(
        long = "requests",
        short = 'n',
        alias = "per-worker",
        default_value = "1",
        value_parser = parse_positive_u64
    )]
    pub requests_per_worker: PositiveU64,

    /// Delay between requests of one worker (supports ms/s/m/h, 0 disables)
    #[arg(long, default_value = "30s", value_parser = parse_delay_arg)]
    pub delay: Duration,

    /// Raw request body sent verbatim on POST/PUT/PATCH/DELETE
    #[arg(long, short = 'd', conflicts_with = "data_file")]
    pub data: Option<String>,

    /// Raw request body read from a file
    #[arg(long = "data-file", short = 'D')]
    pub data_file: Option<String>,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long = "timeout", default_value = "30s", value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// Connection timeout (supports ms/s/m/h)
    #[arg(long = "connect-timeout", default_value = "10s", value_parser = parse_duration_arg)]
    pub connect_timeout: Duration,

    /// Path to config file (TOML or JSON)
    #[arg(long)]
    pub config: Option<String>,

    /// Summary output format
    #[arg(long = "output-format", default_value = "text", ignore_case = true)]
    pub output_format: OutputFormat,

    /// Do not watch the keyboard for the stop key
    #[arg(long = "no-keyboard")]
    pub no_keyboard: bool,

    /// Run the interactive console menu
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}
