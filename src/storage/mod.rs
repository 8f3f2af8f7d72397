//! Context store backends.
//!
//! | Backend | Feature | Ordering |
//! |---------|---------|----------|
//! | [`MemoryContextStore`] | always | `Vec` insertion order |
//! | `RedisContextStore` | `redis` | list order (`RPUSH`/`LRANGE`) |
//! | `PostgresContextStore` | `postgres` | `BIGSERIAL` sequence |

// Dropping lock guards slightly early provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

mod memory;
pub mod postgresql;
pub mod redis;
mod traits;

pub use memory::MemoryContextStore;
#[cfg(feature = "postgres")]
pub use postgresql::PostgresContextStore;
#[cfg(feature = "redis")]
pub use redis::RedisContextStore;
pub use traits::{ContextStore, SearchOutcome, keyword_search};
