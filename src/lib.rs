//! Core library for the `loadrunner` CLI.
//!
//! The crate drives a fixed pool of concurrent workers against one HTTP
//! endpoint. Each worker issues a bounded sequence of requests with an
//! optional delay between them; results are folded into a [`runner::RunSummary`]
//! with success/failure counts, throughput and a bounded sample of failures.
//! Runs can be cut short cooperatively through a [`runner::StopSource`].
//!
//! The binary adds argument parsing, config files, keyboard/signal stop
//! sources and an interactive console on top of these building blocks.
pub mod args;
pub mod config;
pub mod error;
pub mod http;
pub mod runner;
