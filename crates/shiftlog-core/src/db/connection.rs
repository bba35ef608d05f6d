//! Database connection management

use std::path::Path;

use libsql::{Builder, Connection, Database as LibSqlDatabase};

use crate::error::Result;

use super::migrations;

/// Database wrapper for libSQL connections
pub struct Database {
    db: LibSqlDatabase,
    conn: Connection,
}

impl Database {
    /// Open a database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        let conn = db.connect()?;

        let database = Self { db, conn };
        database.configure().await?;
        database.migrate().await?;
        Ok(database)
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;

        let database = Self { db, conn };
        database.configure().await?;
        database.migrate().await?;
        Ok(database)
    }

    /// The primary connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Open an additional connection to the same database.
    ///
    /// Concurrent callers (a scheduled closer run next to a manual one)
    /// each get their own connection; coordination happens through the
    /// store's transactions, never through shared in-process state.
    pub async fn connect(&self) -> Result<Connection> {
        let conn = self.db.connect()?;
        Self::configure_connection(&conn).await?;
        Ok(conn)
    }

    async fn configure(&self) -> Result<()> {
        Self::configure_connection(&self.conn).await
    }

    async fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        conn.execute("PRAGMA busy_timeout = 5000", ()).await?;
        Ok(())
    }

    async fn migrate(&self) -> Result<()> {
        migrations::run(&self.conn).await
    }
}
