//! Utils

use clap::{Parser, ValueEnum};

/// Log output format
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs
    #[default]
    Compact,

    /// Structured JSON logs
    Json,
}

/// Arguments for the checkout demo
#[derive(Debug, Parser)]
pub struct DemoArgs {
    /// Fixture set to load the catalog and cart script from
    #[arg(short, long, default_value = "chair")]
    pub fixture: String,

    /// Directory containing the fixture sets
    #[arg(long, default_value = "./fixtures")]
    pub fixtures_dir: String,

    /// Id for the placed order
    #[arg(long, default_value = "order-1")]
    pub order_id: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}
