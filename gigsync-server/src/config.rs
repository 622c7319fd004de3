use clap::Parser;

use crate::db::DbOpts;
use crate::o11y::O11yOpts;
use crate::sync::SyncOpts;

#[derive(Debug, Clone, Parser)]
pub struct Config {
    /// Port to listen on
    #[clap(short, long, env, default_value = "7300")]
    pub port: u16,

    /// Address to bind the HTTP and WebSocket API to
    #[clap(long, env, default_value = "0.0.0.0")]
    pub bind: String,

    #[clap(flatten)]
    pub db: DbOpts,

    #[clap(flatten)]
    pub sync: SyncOpts,

    #[clap(flatten)]
    pub o11y: O11yOpts,
}
