// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opens a connection with the pragmas this service needs and runs
//! migrations before handing it back.

use crate::error::StoreError;
use crate::migrations::{self, MIGRATIONS};
use rusqlite::Connection;
use std::path::Path;

pub fn open(path: &Path) -> Result<Connection, StoreError> {
    let mut conn = Connection::open(path)?;
    configure(&mut conn)?;
    migrations::run(&mut conn, MIGRATIONS)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection, StoreError> {
    let mut conn = Connection::open_in_memory()?;
    configure(&mut conn)?;
    migrations::run(&mut conn, MIGRATIONS)?;
    Ok(conn)
}

fn configure(conn: &mut Connection) -> Result<(), StoreError> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}
