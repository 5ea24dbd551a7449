use crate::{SqliteConnection, SqliteDriver};
use journal_core::{
    Driver, Executor, Query, QueryResult, Result, SqlWriter, Transaction, stream::Stream,
};
use libsqlite3_sys::{SQLITE_OK, sqlite3_exec};
use std::{ffi::CString, ptr};

/// Transaction opened with `BEGIN IMMEDIATE`, it holds the write lock until it ends.
///
/// Dropping it without calling `commit` or `rollback` rolls it back.
pub struct SqliteTransaction<'c> {
    connection: &'c mut SqliteConnection,
    finished: bool,
}

impl<'c> SqliteTransaction<'c> {
    pub async fn new(connection: &'c mut SqliteConnection) -> Result<Self> {
        let mut sql = String::new();
        connection
            .driver()
            .sql_writer()
            .write_transaction_begin(&mut sql);
        connection.execute(sql.into()).await?;
        Ok(Self {
            connection,
            finished: false,
        })
    }
}

impl<'c> Executor for SqliteTransaction<'c> {
    type Driver = SqliteDriver;

    fn driver(&self) -> &SqliteDriver {
        self.connection.driver()
    }

    fn prepare(
        &mut self,
        query: String,
    ) -> impl Future<Output = Result<Query<SqliteDriver>>> + Send {
        self.connection.prepare(query)
    }

    fn run(&mut self, query: Query<SqliteDriver>) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.connection.run(query)
    }
}

impl<'c> Transaction<'c> for SqliteTransaction<'c> {
    fn commit(mut self) -> impl Future<Output = Result<()>> + Send {
        let mut sql = String::new();
        self.driver()
            .sql_writer()
            .write_transaction_commit(&mut sql);
        async move {
            self.connection.execute(sql.into()).await?;
            self.finished = true;
            Ok(())
        }
    }

    fn rollback(mut self) -> impl Future<Output = Result<()>> + Send {
        let mut sql = String::new();
        self.driver()
            .sql_writer()
            .write_transaction_rollback(&mut sql);
        async move {
            self.connection.execute(sql.into()).await?;
            self.finished = true;
            Ok(())
        }
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut sql = String::new();
        self.driver()
            .sql_writer()
            .write_transaction_rollback(&mut sql);
        let Ok(sql) = CString::new(sql) else {
            return;
        };
        let rc = unsafe {
            sqlite3_exec(
                **self.connection.connection,
                sql.as_ptr(),
                None,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        if rc == SQLITE_OK {
            log::warn!("Transaction dropped before completion, it was rolled back");
        } else {
            log::error!("Could not roll back the transaction dropped before completion");
        }
    }
}
