use std::str::FromStr;

use clap::Args;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::*;

use gigsync_api::GigError;

pub use sessions::SessionStore;

use crate::catalog::SqliteCatalog;

mod migrations;
mod sessions;


#[derive(Args, Clone, Debug)]
pub struct DbOpts {
    /// Sqlite database holding the catalog and active gig sessions
    #[clap(long, env, default_value = "sqlite://gigsync.db")]
    pub database_url: String,

    /// Upper bound of pooled database connections
    #[clap(long, env, default_value = "4")]
    pub database_max_connections: u32,
}

#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

pub async fn init(opts: &DbOpts) -> anyhow::Result<Db> {
    let url = &opts.database_url;
    debug!(%url, "Initializing database");

    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(opts.database_max_connections)
                                       .connect_with(options)
                                       .await?;

    let db = Db { pool };

    debug!("Running migrations");

    db.apply_migrations().await?;

    debug!("Migrations done");

    Ok(db)
}

impl Db {
    pub fn sessions(&self) -> SessionStore {
        SessionStore::new(self.pool.clone())
    }

    pub fn catalog(&self) -> SqliteCatalog {
        SqliteCatalog::new(self.pool.clone())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn storage_error(err: sqlx::Error) -> GigError {
    GigError::Io { error: err.to_string() }
}
