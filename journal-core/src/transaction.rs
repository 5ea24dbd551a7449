use crate::{Executor, Result};
use std::future::Future;

/// Executor bound to an open transaction. Dropping it without committing rolls back.
pub trait Transaction<'c>: Executor {
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
