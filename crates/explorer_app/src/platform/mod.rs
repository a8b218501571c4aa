mod config;
mod host;
mod logging;
mod render;

pub use host::run_app;
