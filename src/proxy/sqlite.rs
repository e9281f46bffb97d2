//! SQLite proxy store
//!
//! This module provides a SQLite-based implementation of the ProxyStore trait.

use crate::proxy::schema::initialize_schema;
use crate::proxy::traits::{ProxyError, ProxyRecord, ProxyResult, ProxyStore};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite proxy store
///
/// Timestamps are stored as fixed-width RFC 3339 text, so ordering by the
/// column orders by time.
pub struct SqliteProxyStore {
    conn: Mutex<Connection>,
}

impl SqliteProxyStore {
    /// Opens or creates a proxy store
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteProxyStore)` - Successfully opened/created database
    /// * `Err(ProxyError)` - Failed to open database
    pub fn open(path: &Path) -> ProxyResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory store
    pub fn open_in_memory() -> ProxyResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Adds a proxy or updates the active flag of a known one
    pub fn upsert(&self, address: &str, active: bool) -> ProxyResult<()> {
        self.lock()?.execute(
            "INSERT INTO proxies (address, active) VALUES (?1, ?2)
             ON CONFLICT(address) DO UPDATE SET active = excluded.active",
            params![address, active],
        )?;
        Ok(())
    }

    /// Looks a proxy up by address
    pub fn get(&self, address: &str) -> ProxyResult<Option<ProxyRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT address, active, last_used_at FROM proxies WHERE address = ?1",
                params![address],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(to_record).transpose()
    }

    /// Number of proxies in the store
    pub fn count(&self) -> ProxyResult<u64> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM proxies", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn lock(&self) -> ProxyResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| ProxyError::LockPoisoned)
    }
}

impl ProxyStore for SqliteProxyStore {
    fn active_oldest_used(&self) -> ProxyResult<Option<ProxyRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT address, active, last_used_at FROM proxies
                 WHERE active = 1
                 ORDER BY last_used_at IS NOT NULL, last_used_at ASC, id ASC
                 LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(to_record).transpose()
    }

    fn record_usage(&self, proxy: &ProxyRecord) -> ProxyResult<()> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let updated = self.lock()?.execute(
            "UPDATE proxies SET last_used_at = ?1 WHERE address = ?2",
            params![now, proxy.address],
        )?;

        if updated == 0 {
            return Err(ProxyError::NotFound(proxy.address.clone()));
        }
        Ok(())
    }
}

fn to_record(
    (address, active, last_used_at): (String, bool, Option<String>),
) -> ProxyResult<ProxyRecord> {
    let last_used_at = match last_used_at {
        Some(value) => Some(
            DateTime::parse_from_rfc3339(&value)
                .map_err(|_| ProxyError::InvalidTimestamp {
                    address: address.clone(),
                    value: value.clone(),
                })?
                .with_timezone(&Utc),
        ),
        None => None,
    };

    Ok(ProxyRecord {
        address,
        active,
        last_used_at,
    })
}
