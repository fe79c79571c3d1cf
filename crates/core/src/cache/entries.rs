//! Partition and entry CRUD operations.
//!
//! Rows are keyed by `(partition, key_hash)`; deleting a partition row
//! cascades to its entries.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use crate::http::{RequestKey, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Listing row for a stored entry. Bodies are not loaded.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntrySummary {
    pub method: String,
    pub url: String,
    pub vary: String,
    pub status: u16,
    pub size_bytes: u64,
    pub stored_at: String,
}

impl CacheDb {
    /// Create a partition if absent. Returns true when a new row was written.
    pub async fn create_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![name, created_at],
                )?;
                Ok(inserted > 0)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn partition_exists(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All partition names, oldest first.
    pub async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and its entries. Returns false if it did not exist.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace the entry for `key` in `partition`.
    ///
    /// Fails with [`Error::PartitionGone`] when the partition no longer exists.
    pub async fn put_entry(&self, partition: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        let partition = partition.to_string();
        let key = key.clone();
        let key_hash = compute_cache_key(&key);
        let headers_json = serde_json::to_string(&response.headers)?;
        let status = response.status;
        let status_text = response.status_text.clone();
        let response_url = response.url.clone();
        let body = response.body.to_vec();
        let stored_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)",
                    params![partition],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Err(Error::PartitionGone(partition));
                }

                conn.execute(
                    "INSERT INTO entries (
                        partition, key_hash, method, url, vary, status, status_text,
                        headers_json, response_url, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    ON CONFLICT(partition, key_hash) DO UPDATE SET
                        status = excluded.status,
                        status_text = excluded.status_text,
                        headers_json = excluded.headers_json,
                        response_url = excluded.response_url,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        partition,
                        key_hash,
                        key.method,
                        key.url,
                        key.vary,
                        status,
                        status_text,
                        headers_json,
                        response_url,
                        body,
                        stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the stored response for `key` in `partition`.
    ///
    /// A missing partition reads as a miss.
    pub async fn get_entry(&self, partition: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let partition = partition.to_string();
        let key_hash = compute_cache_key(key);
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, status_text, headers_json, response_url, body
                     FROM entries WHERE partition = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![partition, key_hash], |row| {
                    Ok((
                        row.get::<_, u16>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                    ))
                });

                match result {
                    Ok((status, status_text, headers_json, url, body)) => Ok(Some(Response {
                        status,
                        status_text,
                        headers: serde_json::from_str(&headers_json)?,
                        body: Bytes::from(body),
                        url,
                    })),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List entries of a partition, newest first.
    pub async fn list_entries(&self, partition: &str) -> Result<Vec<EntrySummary>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntrySummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, vary, status, LENGTH(body), stored_at
                     FROM entries WHERE partition = ?1 ORDER BY stored_at DESC",
                )?;
                let rows = stmt
                    .query_map(params![partition], |row| {
                        Ok(EntrySummary {
                            method: row.get(0)?,
                            url: row.get(1)?,
                            vary: row.get(2)?,
                            status: row.get(3)?,
                            size_bytes: row.get::<_, i64>(4)? as u64,
                            stored_at: row.get(5)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn count_entries(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![partition], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries whose parsed URL host equals `host` (ASCII case-insensitive).
    ///
    /// Look-alike hosts and URLs that only mention `host` in their path or
    /// query are kept. Returns the number of deleted entries.
    pub async fn purge_entries_by_host(&self, partition: &str, host: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        let host = host.trim().to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let matching = {
                    let mut stmt = tx.prepare("SELECT key_hash, url FROM entries WHERE partition = ?1")?;
                    stmt.query_map(params![partition], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                        .collect::<Result<Vec<_>, _>>()?
                        .into_iter()
                        .filter(|(_, url)| url_host_is(url, &host))
                        .map(|(key_hash, _)| key_hash)
                        .collect::<Vec<_>>()
                };

                let mut deleted = 0;
                for key_hash in &matching {
                    deleted += tx.execute(
                        "DELETE FROM entries WHERE partition = ?1 AND key_hash = ?2",
                        params![partition, key_hash],
                    )?;
                }
                tx.commit()?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Drop the oldest entries of a partition until at most `max_entries` remain.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_lru_entries(&self, partition: &str, max_entries: usize) -> Result<u64, Error> {
        let partition = partition.to_string();
        let max = max_entries as i64;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![partition], |row| {
                        row.get(0)
                    })?;
                if count <= max {
                    return Ok(0);
                }

                let deleted = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND key_hash IN (
                        SELECT key_hash FROM entries WHERE partition = ?1
                        ORDER BY stored_at ASC LIMIT ?2
                    )",
                    params![partition, count - max],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}

fn url_host_is(url: &str, host: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case(host)))
        .unwrap_or(false)
}
