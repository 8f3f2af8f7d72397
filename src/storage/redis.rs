//! Redis-backed context store.
//!
//! Records are JSON documents in a single Redis list, so `LRANGE 0 -1`
//! returns them in insertion order.
//!
//! A single connection is cached per store and reused across calls. Reads
//! and writes use a 5-second timeout so a stalled server cannot hang a
//! request worker.

#[cfg(feature = "redis")]
mod implementation {
    use crate::models::ContextRecord;
    use crate::storage::traits::ContextStore;
    use crate::{Error, Result};
    use redis::{Client, Connection};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Default timeout for Redis operations.
    const REDIS_TIMEOUT: Duration = Duration::from_secs(5);

    /// Context store backed by a Redis list.
    pub struct RedisContextStore {
        /// Redis client.
        client: Client,
        /// List key.
        key: String,
        /// Cached connection for reuse.
        connection: Mutex<Option<Connection>>,
    }

    fn redis_error(operation: &str, e: impl std::fmt::Display) -> Error {
        Error::OperationFailed {
            operation: operation.to_string(),
            cause: e.to_string(),
        }
    }

    impl RedisContextStore {
        /// Creates a store and verifies the server is reachable.
        ///
        /// # Errors
        ///
        /// Returns an error if the URL is invalid or the server does not
        /// answer `PING`.
        pub fn new(connection_url: &str, key: impl Into<String>) -> Result<Self> {
            let client = Client::open(connection_url).map_err(|e| redis_error("redis_connect", e))?;

            let store = Self {
                client,
                key: key.into(),
                connection: Mutex::new(None),
            };

            store.with_connection("redis_ping", |conn| {
                redis::cmd("PING").query::<String>(conn).map(|_| ())
            })?;

            Ok(store)
        }

        /// Gets a connection, reusing the cached one if available.
        fn get_connection(&self) -> Result<Connection> {
            let mut guard = self
                .connection
                .lock()
                .map_err(|e| redis_error("redis_lock_connection", e))?;

            if let Some(conn) = guard.take() {
                return Ok(conn);
            }

            let conn = self
                .client
                .get_connection()
                .map_err(|e| redis_error("redis_get_connection", e))?;
            conn.set_read_timeout(Some(REDIS_TIMEOUT))
                .map_err(|e| redis_error("redis_set_read_timeout", e))?;
            conn.set_write_timeout(Some(REDIS_TIMEOUT))
                .map_err(|e| redis_error("redis_set_write_timeout", e))?;

            Ok(conn)
        }

        /// Returns a connection to the cache for reuse.
        fn return_connection(&self, conn: Connection) {
            if let Ok(mut guard) = self.connection.lock() {
                *guard = Some(conn);
            }
        }

        /// Runs `f` on a cached connection. A failed command drops the
        /// connection so the next call reconnects.
        fn with_connection<T>(
            &self,
            operation: &str,
            f: impl FnOnce(&mut Connection) -> redis::RedisResult<T>,
        ) -> Result<T> {
            let mut conn = self.get_connection()?;
            match f(&mut conn) {
                Ok(value) => {
                    self.return_connection(conn);
                    Ok(value)
                },
                Err(e) => {
                    tracing::warn!(operation, error = %e, "Redis command failed");
                    Err(redis_error(operation, e))
                },
            }
        }
    }

    impl ContextStore for RedisContextStore {
        fn name(&self) -> &'static str {
            "redis"
        }

        fn append(&self, record: ContextRecord) -> Result<()> {
            let json = serde_json::to_string(&record)
                .map_err(|e| redis_error("redis_serialize_record", e))?;
            self.with_connection("redis_append", |conn| {
                redis::cmd("RPUSH")
                    .arg(&self.key)
                    .arg(json)
                    .query::<i64>(conn)
                    .map(|_| ())
            })
        }

        fn list_all(&self) -> Result<Vec<ContextRecord>> {
            let raw: Vec<String> = self.with_connection("redis_list", |conn| {
                redis::cmd("LRANGE").arg(&self.key).arg(0).arg(-1).query(conn)
            })?;

            let mut records = Vec::with_capacity(raw.len());
            for item in raw {
                match serde_json::from_str::<ContextRecord>(&item) {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!(error = %e, "Skipping undecodable record in Redis"),
                }
            }
            Ok(records)
        }

        fn reset(&self) -> Result<usize> {
            self.with_connection("redis_reset", |conn| {
                let (len, _deleted): (usize, i64) = redis::pipe()
                    .atomic()
                    .cmd("LLEN")
                    .arg(&self.key)
                    .cmd("DEL")
                    .arg(&self.key)
                    .query(conn)?;
                Ok(len)
            })
        }

        fn count(&self) -> Result<usize> {
            self.with_connection("redis_count", |conn| {
                redis::cmd("LLEN").arg(&self.key).query(conn)
            })
        }
    }
}

#[cfg(feature = "redis")]
pub use implementation::RedisContextStore;
