use crate::{Driver, Executor, Result};
use std::{borrow::Cow, future::Future};

pub trait Connection: Executor {
    /// Open a connection to the database located by `url`.
    fn connect(url: Cow<'static, str>) -> impl Future<Output = Result<Self>> + Send;

    /// Start a transaction, the connection is borrowed until it is committed or rolled back.
    fn begin(
        &mut self,
    ) -> impl Future<Output = Result<<Self::Driver as Driver>::Transaction<'_>>> + Send;
}
