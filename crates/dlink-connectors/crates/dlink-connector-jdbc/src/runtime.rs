//! Tokio runtime shared by the database backends
//!
//! Connector calls are synchronous. `mysql_async` and `tokio-postgres` spawn
//! onto the current runtime, so every backend call runs inside this one.

use std::future::Future;

use dlink_core::{LinkError, Result};
use once_cell::sync::OnceCell;
use tokio::runtime::Runtime;

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Get or create the backend runtime
pub fn get_runtime() -> Result<&'static Runtime> {
    RUNTIME.get_or_try_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("dlink-jdbc-runtime")
            .build()
            .map_err(|e| LinkError::Other(format!("failed to create JDBC runtime: {}", e)))
    })
}

/// Block the current thread on `future`, driven by the backend runtime.
pub fn block_on<F>(future: F) -> Result<F::Output>
where
    F: Future,
{
    Ok(get_runtime()?.block_on(future))
}
