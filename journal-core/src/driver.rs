use crate::{Connection, Prepared, SqlWriter, Transaction};

/// Entry point of a database backend, ties together its connection, dialect and statements.
pub trait Driver: Send + Sync + Sized + 'static {
    type Connection: Connection<Driver = Self>;
    type SqlWriter: SqlWriter;
    type Prepared: Prepared;
    type Transaction<'c>: Transaction<'c, Driver = Self>;

    /// Name used in logs and urls.
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;
}
