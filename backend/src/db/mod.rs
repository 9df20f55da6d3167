//! SQLite persistence.
//!
//! There is no pool: like the rest of the services, every operation opens its
//! own connection to the database file. [`Database::run`] does that on tokio's
//! blocking pool so the actix workers never wait on disk or on SQLite locks.

use crate::error::ApiError;
use log::info;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS bloque (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    letra TEXT NOT NULL UNIQUE CHECK (length(letra) = 1)
);

CREATE TABLE IF NOT EXISTS casilleros (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    bloque INTEGER NOT NULL REFERENCES bloque(id) ON DELETE CASCADE,
    numero INTEGER NOT NULL CHECK (numero > 0),
    ocupado INTEGER NOT NULL DEFAULT 0,
    propietario TEXT,
    correo TEXT,
    telefono TEXT,
    registrado_por TEXT,
    comprobante BLOB,
    UNIQUE (bloque, numero)
);

CREATE INDEX IF NOT EXISTS idx_casilleros_bloque ON casilleros(bloque);

CREATE TABLE IF NOT EXISTS usuarios (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL,
    apellido TEXT NOT NULL,
    correo TEXT NOT NULL UNIQUE,
    contrasena TEXT NOT NULL,
    usuario TEXT NOT NULL UNIQUE,
    rol INTEGER NOT NULL DEFAULT 0
);
"#;

/// Handle to the database file. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Database {
    path: Arc<PathBuf>,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Arc::new(path.as_ref().to_path_buf()),
        }
    }

    /// Opens a connection with foreign keys enforced.
    pub fn open(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(self.path.as_path())?;
        prepare(&conn)?;
        Ok(conn)
    }

    /// Creates the schema if needed. Called once at startup.
    pub fn initialize(&self) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ApiError::Internal(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
        let conn = self.open()?;
        create_schema(&conn)?;
        info!("Database ready at {}", self.path.display());
        Ok(())
    }

    /// Runs `f` against a fresh connection on the blocking thread pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = db.open()?;
            f(&mut conn)
        })
        .await?
    }
}

/// Per-connection settings. SQLite does not persist `foreign_keys`, so the
/// block cascade only works on connections that went through here.
pub fn prepare(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// In-memory database with the schema applied, for tests.
#[cfg(test)]
pub fn memory() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    prepare(&conn).unwrap();
    create_schema(&conn).unwrap();
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let conn = memory();
        create_schema(&conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('bloque', 'casilleros', 'usuarios')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn lockers_need_a_block() {
        let conn = memory();
        let err = conn
            .execute("INSERT INTO casilleros (bloque, numero) VALUES (99, 1)", [])
            .unwrap_err();
        assert!(crate::error::is_constraint_violation(&err));
    }

    #[test]
    fn unusable_parent_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let db = Database::new(blocker.join("nested").join("test.sqlite"));
        let err = db.initialize().unwrap_err();
        assert!(matches!(err, ApiError::Internal(m) if m.contains("blocker")));
    }

    #[actix_web::test]
    async fn run_uses_a_prepared_connection() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("test.sqlite"));
        db.initialize().unwrap();

        let enabled: i64 = db
            .run(|conn| Ok(conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
