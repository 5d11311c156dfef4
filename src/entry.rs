use std::io::IsTerminal;

use clap::{CommandFactory, FromArgMatches};
use tokio::runtime::Runtime;
use tracing::{error, warn};
use url::Url;

use loadrunner::args::LoadArgs;
use loadrunner::config::{apply_config, load_config};
use loadrunner::error::{AppResult, HttpError, ValidationError};
use loadrunner::http::ClientSettings;
use loadrunner::runner::{AnyStop, LoadRunner, ManualStop, RunConfig, RunSummary};

use crate::app::{ConsoleMenu, MenuAction, MenuDefaults, RunRequest, print_summary};
use crate::shutdown_handlers::{KeyboardStopSource, RawModeGuard, spawn_signal_stop_handler};

pub(crate) fn run() -> AppResult<()> {
    let matches = LoadArgs::command().get_matches();
    let mut args = LoadArgs::from_arg_matches(&matches)?;

    crate::logger::init_logging(args.verbose);

    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let runner = {
        let _context = runtime.enter();
        LoadRunner::from_settings(&ClientSettings::from_args(&args))?
    };

    if args.interactive {
        return run_interactive(&runtime, &runner, &args);
    }

    let config = build_run_config(&args)?;
    let summary = runtime.block_on(run_once(&runner, config, watch_keyboard(&args)))?;
    print_summary(&summary, args.output_format)
}

fn run_interactive(runtime: &Runtime, runner: &LoadRunner, args: &LoadArgs) -> AppResult<()> {
    let defaults = MenuDefaults {
        url: args.url.clone(),
        credential: args.credential.clone(),
    };
    let mut menu = ConsoleMenu::new(std::io::stdin().lock(), std::io::stdout(), defaults);

    loop {
        let request = match menu.next_action()? {
            MenuAction::Run(request) => request,
            MenuAction::Exit => return Ok(()),
        };
        let config = match build_run_config(&apply_request(args, request)) {
            Ok(config) => config,
            Err(err) => {
                error!("{}", err);
                continue;
            }
        };
        let summary = runtime.block_on(run_once(runner, config, watch_keyboard(args)))?;
        print_summary(&summary, args.output_format)?;
        menu.pause()?;
    }
}

fn apply_request(args: &LoadArgs, request: RunRequest) -> LoadArgs {
    let mut args = args.clone();
    args.url = Some(request.url);
    args.credential = request.credential;
    args.concurrency = request.concurrency;
    args.requests_per_worker = request.requests_per_worker;
    args.delay = request.delay;
    args
}

/// One run with Ctrl+C/SIGTERM and, on a terminal, the `S` key as stop sources.
async fn run_once(
    runner: &LoadRunner,
    config: RunConfig,
    keyboard: bool,
) -> AppResult<RunSummary> {
    let signal_stop = ManualStop::new();
    let signal_handle = spawn_signal_stop_handler(signal_stop.clone());
    let mut stop = AnyStop::new().with(signal_stop);

    let raw_mode = if keyboard {
        eprintln!("Running... Press 'S' to stop.");
        match RawModeGuard::enable() {
            Ok(guard) => {
                stop = stop.with(KeyboardStopSource);
                Some(guard)
            }
            Err(err) => {
                warn!("Keyboard stop unavailable: {}", err);
                None
            }
        }
    } else {
        None
    };

    let result = runner.run_until(config, stop).await;
    drop(raw_mode);
    signal_handle.abort();
    result
}

fn watch_keyboard(args: &LoadArgs) -> bool {
    !args.no_keyboard && std::io::stdin().is_terminal()
}

/// Validates the merged arguments into a run configuration.
pub(crate) fn build_run_config(args: &LoadArgs) -> AppResult<RunConfig> {
    let url = validate_url(args.url.as_deref())?;
    let body = read_body(args)?;
    Ok(RunConfig::new(url, args.method)
        .with_load(args.concurrency, args.requests_per_worker)
        .with_delay(args.delay)
        .with_credential(args.credential.clone(), args.credential_placement)
        .with_body(body))
}

fn validate_url(url: Option<&str>) -> AppResult<String> {
    let url = url.ok_or(ValidationError::MissingUrl)?.trim();
    if url.is_empty() {
        return Err(ValidationError::BlankUrl.into());
    }
    Url::parse(url).map_err(|source| HttpError::InvalidUrl {
        url: url.to_owned(),
        source,
    })?;
    Ok(url.to_owned())
}

fn read_body(args: &LoadArgs) -> AppResult<Option<String>> {
    if let Some(data) = &args.data {
        return Ok(Some(data.clone()));
    }
    let Some(path) = args.data_file.as_deref() else {
        return Ok(None);
    };
    let body = std::fs::read_to_string(path).map_err(|source| ValidationError::ReadBodyFile {
        path: path.to_owned(),
        source,
    })?;
    Ok(Some(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use loadrunner::args::{CredentialPlacement, HttpMethod};
    use loadrunner::error::AppError;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Result<LoadArgs, String> {
        let argv = std::iter::once("loadrunner").chain(args.iter().copied());
        LoadArgs::try_parse_from(argv).map_err(|err| format!("parse failed: {}", err))
    }

    #[test]
    fn builds_config_from_arguments() -> Result<(), String> {
        let args = parse(&[
            "-u",
            "  http://localhost:5000/api/measurements ",
            "-X",
            "post",
            "-k",
            "abc",
            "--credential-placement",
            "header",
            "-c",
            "3",
            "-n",
            "7",
            "--delay",
            "0",
            "-d",
            "{\"a\":1}",
        ])?;
        let config = build_run_config(&args).map_err(|err| err.to_string())?;
        if config.url != "http://localhost:5000/api/measurements" || config.method != HttpMethod::Post {
            return Err(format!("Unexpected target {:?}", config));
        }
        if config.credential() != Some("abc")
            || config.credential_placement != CredentialPlacement::Header
        {
            return Err("Unexpected credential".to_owned());
        }
        if config.planned_requests() != 21 || config.body.as_deref() != Some("{\"a\":1}") {
            return Err(format!("Unexpected load {:?}", config));
        }
        Ok(())
    }

    #[test]
    fn body_is_read_from_file() -> Result<(), String> {
        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let path = dir.path().join("body.json");
        std::fs::write(&path, "{\"b\":2}").map_err(|err| format!("write failed: {}", err))?;
        let path = path.to_str().ok_or_else(|| "non-utf8 path".to_owned())?;

        let args = parse(&["-u", "http://h/x", "-D", path])?;
        let config = build_run_config(&args).map_err(|err| err.to_string())?;
        if config.body.as_deref() != Some("{\"b\":2}") {
            return Err(format!("Unexpected body {:?}", config.body));
        }

        let args = parse(&["-u", "http://h/x", "-D", "/definitely/missing/body.json"])?;
        match build_run_config(&args) {
            Err(AppError::Validation(ValidationError::ReadBodyFile { .. })) => Ok(()),
            other => Err(format!("Unexpected result {:?}", other)),
        }
    }

    #[test]
    fn url_is_required_and_validated() -> Result<(), String> {
        match build_run_config(&parse(&[])?) {
            Err(AppError::Validation(ValidationError::MissingUrl)) => {}
            other => return Err(format!("Unexpected result {:?}", other)),
        }
        match build_run_config(&parse(&["-u", "   "])?) {
            Err(AppError::Validation(ValidationError::BlankUrl)) => {}
            other => return Err(format!("Unexpected result {:?}", other)),
        }
        match build_run_config(&parse(&["-u", "not a url"])?) {
            Err(AppError::Http(HttpError::InvalidUrl { .. })) => Ok(()),
            other => Err(format!("Unexpected result {:?}", other)),
        }
    }

    #[test]
    fn menu_answers_replace_arguments() -> Result<(), String> {
        let args = parse(&["-u", "http://configured/", "-k", "cfg", "-X", "put"])?;
        let request = RunRequest {
            url: "http://other/".to_owned(),
            credential: None,
            concurrency: loadrunner::args::PositiveUsize::MIN,
            requests_per_worker: loadrunner::args::PositiveU64::MIN,
            delay: std::time::Duration::from_secs(2),
        };
        let merged = apply_request(&args, request);
        if merged.url.as_deref() != Some("http://other/")
            || merged.credential.is_some()
            || merged.method != HttpMethod::Put
            || merged.delay != std::time::Duration::from_secs(2)
        {
            return Err(format!("Unexpected merge {:?}", merged));
        }
        Ok(())
    }
}
