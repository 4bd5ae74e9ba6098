use anyhow::Result;
use libsql::{Builder, Connection};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

use crate::constants::DATABASE_FILE;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name     TEXT    NOT NULL,
    last_name      TEXT    NOT NULL,
    email          TEXT    UNIQUE NOT NULL,
    cpf            TEXT    UNIQUE,
    phone          TEXT,
    password_hash  TEXT    NOT NULL
);
"#;

const CREATE_CLIENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name  TEXT    NOT NULL,
    last_name   TEXT    NOT NULL,
    email       TEXT    UNIQUE NOT NULL,
    cpf         TEXT    UNIQUE NOT NULL,
    phone       TEXT    NOT NULL,
    address     TEXT,
    complement  TEXT,
    zip_code    TEXT,
    district    TEXT,
    city        TEXT,
    uf          TEXT
);
"#;

const CREATE_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    id_clients  INTEGER NOT NULL,
    description TEXT    NOT NULL,
    due_date    TEXT    NOT NULL,
    value       REAL    NOT NULL,
    paid_out    BOOLEAN NOT NULL DEFAULT FALSE,
    FOREIGN KEY (id_clients) REFERENCES clients(id)
);
"#;

const CREATE_RECORDS_CLIENT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_records_id_clients ON records(id_clients);
"#;

const CREATE_CLIENTS_NAME_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_clients_first_name ON clients(first_name);
"#;

/// Shared handle to the single billing database.
pub type Db = Arc<RwLock<Connection>>;

/// Opens (creating if needed) `billing.db` under `data_dir` and applies the schema.
pub async fn init_main_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(DATABASE_FILE);
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    conn.execute(CREATE_USERS_TABLE, ()).await?;
    conn.execute(CREATE_CLIENTS_TABLE, ()).await?;
    conn.execute(CREATE_RECORDS_TABLE, ()).await?;
    conn.execute(CREATE_RECORDS_CLIENT_INDEX, ()).await?;
    conn.execute(CREATE_CLIENTS_NAME_INDEX, ()).await?;

    Ok(Arc::new(RwLock::new(conn)))
}
