//! Line-based console menu for repeated interactive runs.
use std::io::{BufRead, Write};
use std::time::Duration;

use loadrunner::args::{PositiveU64, PositiveUsize};
use loadrunner::error::{AppError, AppResult};

const DEFAULT_THREADS: u64 = 1;
const DEFAULT_REQUESTS: u64 = 1;
const DEFAULT_DELAY_SECS: u64 = 30;

/// Values offered when a prompt is left blank.
#[derive(Debug, Clone, Default)]
pub(crate) struct MenuDefaults {
    pub(crate) url: Option<String>,
    pub(crate) credential: Option<String>,
}

/// Parameters collected for one interactive run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunRequest {
    pub(crate) url: String,
    pub(crate) credential: Option<String>,
    pub(crate) concurrency: PositiveUsize,
    pub(crate) requests_per_worker: PositiveU64,
    pub(crate) delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MenuAction {
    Run(RunRequest),
    Exit,
}

pub(crate) struct ConsoleMenu<R, W> {
    input: R,
    output: W,
    defaults: MenuDefaults,
}

impl<R, W> ConsoleMenu<R, W>
where
    R: BufRead,
    W: Write,
{
    pub(crate) const fn new(input: R, output: W, defaults: MenuDefaults) -> Self {
        Self {
            input,
            output,
            defaults,
        }
    }

    /// Shows the menu until the user either starts a run or exits. End of
    /// input counts as exit.
    pub(crate) fn next_action(&mut self) -> AppResult<MenuAction> {
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "==== HTTP Load Console ====")?;
            writeln!(self.output, "1) Start sending requests")?;
            writeln!(self.output, "0) Exit")?;
            let Some(selection) = self.prompt("Select: ")? else {
                return Ok(MenuAction::Exit);
            };
            match selection.trim() {
                "0" => return Ok(MenuAction::Exit),
                "1" => {}
                _ => continue,
            }

            match self.collect_run()? {
                Collected::Request(request) => return Ok(MenuAction::Run(request)),
                Collected::Back => {}
                Collected::Eof => return Ok(MenuAction::Exit),
            }
        }
    }

    /// Blocks until the user presses ENTER.
    pub(crate) fn pause(&mut self) -> AppResult<()> {
        self.prompt("Press ENTER to return to menu...")?;
        Ok(())
    }

    fn collect_run(&mut self) -> AppResult<Collected> {
        let default_url = self.defaults.url.clone().unwrap_or_default();
        writeln!(self.output, "API URL (from config): {}", default_url)?;
        let Some(override_url) = self.prompt("Override URL? (leave blank to use default): ")? else {
            return Ok(Collected::Eof);
        };
        let override_url = override_url.trim();
        let url = if override_url.is_empty() {
            default_url
        } else {
            override_url.to_owned()
        };
        if url.trim().is_empty() {
            writeln!(self.output, "No URL provided.")?;
            return Ok(Collected::Back);
        }

        let Some(key) = self.prompt("Key (bootKey) to include in requests (blank = configured key): ")?
        else {
            return Ok(Collected::Eof);
        };
        let key = key.trim();
        let credential = if key.is_empty() {
            self.defaults.credential.clone()
        } else {
            Some(key.to_owned())
        };

        let Some(threads) =
            self.read_int("Concurrent threads [default 1]: ", DEFAULT_THREADS, 1)?
        else {
            return Ok(Collected::Eof);
        };
        let Some(requests) =
            self.read_int("Requests per thread [default 1]: ", DEFAULT_REQUESTS, 1)?
        else {
            return Ok(Collected::Eof);
        };
        let Some(delay_secs) = self.read_int(
            "Delay between requests in seconds [default 30]: ",
            DEFAULT_DELAY_SECS,
            0,
        )?
        else {
            return Ok(Collected::Eof);
        };

        let request = RunRequest {
            url,
            credential,
            concurrency: to_positive_usize(threads)?,
            requests_per_worker: PositiveU64::try_from(requests)?,
            delay: Duration::from_secs(delay_secs),
        };

        writeln!(self.output)?;
        writeln!(self.output, "Target: {}", request.url)?;
        writeln!(
            self.output,
            "bootKey: {}",
            request.credential.as_deref().unwrap_or("(empty)")
        )?;
        writeln!(
            self.output,
            "Threads: {}, Requests/Thread: {}, Delay: {}s",
            threads, requests, delay_secs
        )?;
        let Some(confirm) =
            self.prompt("Press ENTER to start, or type anything else to cancel... ")?
        else {
            return Ok(Collected::Eof);
        };
        if confirm.trim().is_empty() {
            Ok(Collected::Request(request))
        } else {
            Ok(Collected::Back)
        }
    }

    /// Re-prompts until the answer is blank (default) or an integer `>= min`.
    fn read_int(&mut self, prompt: &str, default: u64, min: u64) -> AppResult<Option<u64>> {
        loop {
            let Some(answer) = self.prompt(prompt)? else {
                return Ok(None);
            };
            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(Some(default));
            }
            match answer.parse::<u64>() {
                Ok(value) if value >= min => return Ok(Some(value)),
                Ok(_) | Err(_) => writeln!(
                    self.output,
                    "Please enter an integer of at least {} (or leave blank for {}).",
                    min, default
                )?,
            }
        }
    }

    fn prompt(&mut self, prompt: &str) -> AppResult<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

enum Collected {
    Request(RunRequest),
    Back,
    Eof,
}

fn to_positive_usize(value: u64) -> AppResult<PositiveUsize> {
    let value = usize::try_from(value)
        .map_err(|err| AppError::validation(format!("Too many threads: {}", err)))?;
    Ok(PositiveUsize::try_from(value)?)
}
