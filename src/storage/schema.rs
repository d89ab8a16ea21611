use rusqlite::Connection;

pub mod tables {
    pub const KV: &str = "kv";

    pub const ALL_TABLES: [&str; 1] = [KV];
}

pub mod columns {
    pub const KEY: &str = "key";
    pub const VALUE: &str = "value";
}

use columns::*;
use tables::*;

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute(
        &format!("CREATE TABLE IF NOT EXISTS {KV} ({KEY} TEXT PRIMARY KEY, {VALUE} BLOB NOT NULL)"),
        [],
    )?;
    Ok(())
}
