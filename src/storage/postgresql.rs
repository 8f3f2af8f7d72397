//! PostgreSQL-backed context store.
//!
//! Records live in one table ordered by a `BIGSERIAL` sequence column.
//! Keyword search runs in SQL and keeps the fallback-to-everything law.

#[cfg(feature = "postgres")]
mod implementation {
    use crate::models::{ContextRecord, RecordId, RecordKind};
    use crate::storage::traits::{ContextStore, SearchOutcome};
    use crate::{Error, Result};
    use deadpool_postgres::{Config, Pool, Runtime};
    use tokio::runtime::{Handle, Runtime as TokioRuntime};
    use tokio_postgres::NoTls;

    /// Schema, with `{table}` substituted at startup.
    const SCHEMA: &str = r"
        CREATE TABLE IF NOT EXISTS {table} (
            seq BIGSERIAL PRIMARY KEY,
            id TEXT NOT NULL,
            kind TEXT NOT NULL,
            content TEXT NOT NULL,
            degraded BOOLEAN NOT NULL DEFAULT FALSE,
            metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at_ms BIGINT NOT NULL
        );
    ";

    /// Context store backed by a PostgreSQL table.
    pub struct PostgresContextStore {
        /// Connection pool.
        pool: Pool,
        /// Table name.
        table_name: String,
        /// Drives the pool when the store was created outside a runtime.
        runtime: Option<TokioRuntime>,
    }

    fn pool_error(e: impl std::fmt::Display) -> Error {
        Error::OperationFailed {
            operation: "postgres_get_client".to_string(),
            cause: e.to_string(),
        }
    }

    fn query_error(op: &str, e: impl std::fmt::Display) -> Error {
        Error::OperationFailed {
            operation: op.to_string(),
            cause: e.to_string(),
        }
    }

    impl PostgresContextStore {
        /// Default maximum pool size.
        const DEFAULT_POOL_MAX_SIZE: usize = 8;

        /// Creates a store and ensures the table exists.
        ///
        /// # Errors
        ///
        /// Returns an error if the URL or table name is invalid, or the
        /// database is unreachable.
        pub fn new(connection_url: &str, table_name: impl Into<String>) -> Result<Self> {
            let table_name = table_name.into();
            if !is_valid_identifier(&table_name) {
                return Err(Error::InvalidInput(format!(
                    "invalid table name '{table_name}'"
                )));
            }

            let config = connection_url
                .parse::<tokio_postgres::Config>()
                .map_err(|e| query_error("postgres_parse_url", e))?;
            let cfg = Self::build_pool_config(&config);
            let pool = cfg
                .create_pool(Some(Runtime::Tokio1), NoTls)
                .map_err(|e| query_error("postgres_create_pool", e))?;

            // Pooled connections are driven by the runtime they were opened on.
            let runtime = if Handle::try_current().is_ok() {
                None
            } else {
                Some(
                    tokio::runtime::Builder::new_multi_thread()
                        .worker_threads(1)
                        .thread_name("tracecontext-postgres")
                        .enable_all()
                        .build()
                        .map_err(|e| query_error("postgres_create_runtime", e))?,
                )
            };

            let store = Self {
                pool,
                table_name,
                runtime,
            };
            store.block_on(store.ensure_schema())?;
            Ok(store)
        }

        fn build_pool_config(config: &tokio_postgres::Config) -> Config {
            let mut cfg = Config::new();
            cfg.host = config.get_hosts().first().map(|host| match host {
                tokio_postgres::config::Host::Tcp(s) => s.clone(),
                #[cfg(unix)]
                tokio_postgres::config::Host::Unix(p) => p.to_string_lossy().to_string(),
            });
            cfg.port = config.get_ports().first().copied();
            cfg.user = config.get_user().map(String::from);
            cfg.password = config
                .get_password()
                .map(|p| String::from_utf8_lossy(p).to_string());
            cfg.dbname = config.get_dbname().map(String::from);

            cfg.pool = Some(deadpool_postgres::PoolConfig {
                max_size: Self::DEFAULT_POOL_MAX_SIZE,
                timeouts: deadpool_postgres::Timeouts {
                    wait: Some(std::time::Duration::from_secs(5)),
                    create: Some(std::time::Duration::from_secs(5)),
                    recycle: Some(std::time::Duration::from_secs(5)),
                },
                ..Default::default()
            });
            cfg.manager = Some(deadpool_postgres::ManagerConfig {
                recycling_method: deadpool_postgres::RecyclingMethod::Fast,
            });

            cfg
        }

        /// Runs a future to completion from synchronous code.
        ///
        /// Uses the store's own runtime if it has one, otherwise the ambient
        /// runtime (callers must be on a blocking worker).
        fn block_on<F, T>(&self, f: F) -> Result<T>
        where
            F: std::future::Future<Output = Result<T>>,
        {
            if let Some(runtime) = &self.runtime {
                return runtime.block_on(f);
            }
            Handle::try_current()
                .map_err(|e| query_error("postgres_block_on", e))?
                .block_on(f)
        }

        async fn ensure_schema(&self) -> Result<()> {
            let client = self.pool.get().await.map_err(pool_error)?;
            client
                .batch_execute(&SCHEMA.replace("{table}", &self.table_name))
                .await
                .map_err(|e| query_error("postgres_ensure_schema", e))
        }

        async fn append_async(&self, record: &ContextRecord) -> Result<()> {
            let client = self.pool.get().await.map_err(pool_error)?;
            let metadata = serde_json::to_value(&record.metadata)
                .map_err(|e| query_error("postgres_serialize_metadata", e))?;
            let sql = format!(
                "INSERT INTO {} (id, kind, content, degraded, metadata, created_at_ms)
                 VALUES ($1, $2, $3, $4, $5, $6)",
                self.table_name
            );
            client
                .execute(
                    &sql,
                    &[
                        &record.id.as_str(),
                        &record.kind.tag(),
                        &record.content,
                        &record.degraded,
                        &metadata,
                        &record.created_at.timestamp_millis(),
                    ],
                )
                .await
                .map_err(|e| query_error("postgres_append", e))?;
            Ok(())
        }

        async fn select_async(&self, filter: Option<&str>) -> Result<Vec<ContextRecord>> {
            let client = self.pool.get().await.map_err(pool_error)?;
            let columns = "id, kind, content, degraded, metadata, created_at_ms";
            let rows = match filter {
                Some(needle) => {
                    let sql = format!(
                        "SELECT {columns} FROM {} \
                         WHERE POSITION(LOWER($1) IN LOWER('[' || kind || '] ' || content)) > 0 \
                         ORDER BY seq",
                        self.table_name
                    );
                    client.query(&sql, &[&needle]).await
                },
                None => {
                    let sql = format!("SELECT {columns} FROM {} ORDER BY seq", self.table_name);
                    client.query(&sql, &[]).await
                },
            }
            .map_err(|e| query_error("postgres_select", e))?;

            rows.iter().map(row_to_record).collect()
        }

        async fn reset_async(&self) -> Result<usize> {
            let client = self.pool.get().await.map_err(pool_error)?;
            let deleted = client
                .execute(&format!("DELETE FROM {}", self.table_name), &[])
                .await
                .map_err(|e| query_error("postgres_reset", e))?;
            Ok(usize::try_from(deleted).unwrap_or(usize::MAX))
        }
    }

    fn row_to_record(row: &tokio_postgres::Row) -> Result<ContextRecord> {
        let id: String = row.get(0);
        let kind: String = row.get(1);
        let content: String = row.get(2);
        let degraded: bool = row.get(3);
        let metadata: serde_json::Value = row.get(4);
        let created_ms: i64 = row.get(5);

        let kind = RecordKind::parse(&kind)
            .ok_or_else(|| query_error("postgres_decode_kind", format!("unknown kind '{kind}'")))?;
        let metadata = serde_json::from_value(metadata).unwrap_or_default();

        let mut record = ContextRecord::new(RecordId::new(id), kind, content)
            .with_degraded(degraded)
            .with_metadata(metadata);
        if let Some(created_at) = chrono::DateTime::from_timestamp_millis(created_ms) {
            record.created_at = created_at;
        }
        Ok(record)
    }

    /// Accepts `[A-Za-z_][A-Za-z0-9_]*`, since the table name is spliced into SQL.
    fn is_valid_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    impl ContextStore for PostgresContextStore {
        fn name(&self) -> &'static str {
            "postgres"
        }

        fn append(&self, record: ContextRecord) -> Result<()> {
            self.block_on(self.append_async(&record))
        }

        fn list_all(&self) -> Result<Vec<ContextRecord>> {
            self.block_on(self.select_async(None))
        }

        fn reset(&self) -> Result<usize> {
            self.block_on(self.reset_async())
        }

        fn search(&self, query: &str) -> Result<SearchOutcome> {
            let needle = query.trim();
            if needle.is_empty() {
                return Ok(SearchOutcome {
                    records: self.list_all()?,
                    fallback: false,
                });
            }
            let matches = self.block_on(self.select_async(Some(needle)))?;
            if matches.is_empty() {
                Ok(SearchOutcome {
                    records: self.list_all()?,
                    fallback: true,
                })
            } else {
                Ok(SearchOutcome {
                    records: matches,
                    fallback: false,
                })
            }
        }
    }

}

#[cfg(feature = "postgres")]
pub use implementation::PostgresContextStore;
