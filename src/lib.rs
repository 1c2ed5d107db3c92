//! Study tracker core: subjects, tasks, sessions, plans and cycles, with a
//! persisted stopwatch and a guarded page model for the terminal dashboard.

pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod guard;
pub mod logging;
pub mod models;
pub mod stats;
pub mod storage;
pub mod store;
pub mod timer;
pub mod tui;
