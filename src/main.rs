mod app;
mod entry;
mod logger;
mod shutdown_handlers;

use loadrunner::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
