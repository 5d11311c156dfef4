pub(crate) mod menu;
pub(crate) mod summary;

pub(crate) use menu::{ConsoleMenu, MenuAction, MenuDefaults, RunRequest};
pub(crate) use summary::print_summary;
