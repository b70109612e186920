//! TUI (Terminal User Interface) module

mod app;
mod event;
mod navigation;
mod pages;
mod session;
mod theme;

pub use app::{run, AppConfig};
