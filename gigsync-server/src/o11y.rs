use anyhow::anyhow;
use clap::{Args, ValueEnum};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,gigsync_server=debug,gigsync_api=debug,actix_server=warn,sqlx=warn";

#[derive(Args, Clone, Debug)]
pub struct O11yOpts {
    /// How log lines are written to stdout
    #[clap(long, env, default_value = "text", value_enum)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init(opts: &O11yOpts) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match opts.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
