use sqlx::Executor;

use crate::db::Db;

impl Db {
    async fn migration_0000_gigs(&self) -> anyhow::Result<()> {
        self.pool
            .execute("CREATE TABLE IF NOT EXISTS gig (
                          id      INTEGER PRIMARY KEY,
                          payload BLOB NOT NULL
                      )")
            .await?;

        Ok(())
    }

    /// Catalog tables are owned by the record-keeping side of the application. Creating them here
    /// lets a fresh database start gigs once it has been populated.
    async fn migration_0001_catalog(&self) -> anyhow::Result<()> {
        self.pool
            .execute("CREATE TABLE IF NOT EXISTS vox (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
                      CREATE TABLE IF NOT EXISTS era (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
                      CREATE TABLE IF NOT EXISTS genre (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
                      CREATE TABLE IF NOT EXISTS kit (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
                      CREATE TABLE IF NOT EXISTS lyrics (id INTEGER PRIMARY KEY, text TEXT);
                      CREATE TABLE IF NOT EXISTS track (
                          id        INTEGER PRIMARY KEY,
                          title     TEXT NOT NULL UNIQUE,
                          tempo     INTEGER NOT NULL,
                          click     INTEGER NOT NULL,
                          kit_id    INTEGER,
                          vox_id    INTEGER,
                          era_id    INTEGER,
                          genre_id  INTEGER,
                          lyrics_id INTEGER,
                          key_tone  TEXT
                      );
                      CREATE TABLE IF NOT EXISTS setlist (
                          id        INTEGER PRIMARY KEY,
                          name      TEXT NOT NULL,
                          timestamp INTEGER NOT NULL
                      );
                      CREATE TABLE IF NOT EXISTS a_set (
                          id         INTEGER PRIMARY KEY,
                          setlist_id INTEGER NOT NULL,
                          name       TEXT NOT NULL,
                          setnum     INTEGER NOT NULL
                      );
                      CREATE TABLE IF NOT EXISTS sets_tracks (
                          set_id   INTEGER NOT NULL,
                          track_id INTEGER NOT NULL,
                          seq      INTEGER NOT NULL
                      );")
            .await?;

        Ok(())
    }

    pub(crate) async fn apply_migrations(&self) -> anyhow::Result<()> {
        self.migration_0000_gigs().await?;
        self.migration_0001_catalog().await?;

        Ok(())
    }
}
