use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{LoadArgs, PositiveU64, PositiveUsize};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::{ConfigFile, DurationValue};

/// Applies configuration values to CLI arguments. Values given on the
/// command line always win.
///
/// # Errors
///
/// Returns an error when config values are invalid or conflict with each other.
pub fn apply_config(
    args: &mut LoadArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if config.data.is_some() && config.data_file.is_some() {
        return Err(AppError::config(ConfigError::Conflict {
            left: "data",
            right: "data_file",
        }));
    }

    if !is_cli(matches, "url")
        && let Some(url) = config.target_url()
    {
        args.url = Some(url.to_owned());
    }

    if !is_cli(matches, "method")
        && let Some(method) = config.method
    {
        args.method = method;
    }

    // The env var counts as explicit input as well.
    if !is_explicit(matches, "credential")
        && let Some(key) = config.key.clone()
    {
        args.credential = Some(key);
    }

    if !is_cli(matches, "credential_placement")
        && let Some(placement) = config.credential_placement
    {
        args.credential_placement = placement;
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = ensure_positive_usize(concurrency, "concurrency")?;
    }

    if !is_cli(matches, "requests_per_worker")
        && let Some(requests) = config.requests
    {
        args.requests_per_worker = ensure_positive_u64(requests, "requests")?;
    }

    if !is_cli(matches, "delay")
        && let Some(delay) = config.delay.as_ref()
    {
        args.delay = to_duration(delay, "delay")?;
    }

    if !is_cli(matches, "data") && !is_cli(matches, "data_file") {
        if let Some(data) = config.data.clone() {
            args.data = Some(data);
        }
        if let Some(path) = config.data_file.clone() {
            args.data_file = Some(path);
        }
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = to_positive_duration(timeout, "timeout")?;
    }

    if !is_cli(matches, "connect_timeout")
        && let Some(timeout) = config.connect_timeout.as_ref()
    {
        args.connect_timeout = to_positive_duration(timeout, "connect_timeout")?;
    }

    if !is_cli(matches, "output_format")
        && let Some(format) = config.output_format
    {
        args.output_format = format;
    }

    if !is_cli(matches, "no_keyboard")
        && let Some(no_keyboard) = config.no_keyboard
    {
        args.no_keyboard = no_keyboard;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn is_explicit(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn ensure_positive_u64(value: u64, field: &str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn to_duration(value: &DurationValue, field: &str) -> AppResult<std::time::Duration> {
    value.to_duration().map_err(|err| {
        AppError::config(ConfigError::InvalidDuration {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn to_positive_duration(value: &DurationValue, field: &str) -> AppResult<std::time::Duration> {
    let duration = to_duration(value, field)?;
    if duration.is_zero() {
        return Err(AppError::config(ConfigError::InvalidDuration {
            field: field.to_owned(),
            source: crate::error::ValidationError::DurationZero,
        }));
    }
    Ok(duration)
}
