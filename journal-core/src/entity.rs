use crate::{
    ColumnDef, Driver, Error, Executor, Expression, Result, Row, RowLabeled, RowsAffected,
    SqlWriter, TableDef, Value, stream::Stream,
};
use futures::{FutureExt, StreamExt};
use log::Level;
use std::{future::Future, pin::pin};

/// Record type stored in the table described by [`Entity::table_def`].
///
/// Implementors provide the mapping between the struct and a row, every
/// persistence operation is then available as a default method.
pub trait Entity: Send + Sync + Sized {
    fn table_def() -> &'static TableDef;

    fn from_row(row: RowLabeled) -> Result<Self>;

    /// Column values of this record, `Passive::NotSet` fields are omitted.
    fn row_filtered(&self) -> Box<[(&'static str, Value)]>;

    /// Primary key values in the order of the primary key columns.
    fn primary_key(&self) -> Row;

    fn create_table<Exec: Executor>(
        executor: &mut Exec,
        if_not_exists: bool,
    ) -> impl Future<Output = Result<()>> + Send {
        let mut query = String::with_capacity(1024);
        executor
            .driver()
            .sql_writer()
            .write_create_table(&mut query, Self::table_def(), if_not_exists);
        executor.execute(query.into()).map(|v| v.map(|_| ()))
    }

    fn drop_table<Exec: Executor>(
        executor: &mut Exec,
        if_exists: bool,
    ) -> impl Future<Output = Result<()>> + Send {
        let mut query = String::with_capacity(64);
        executor
            .driver()
            .sql_writer()
            .write_drop_table(&mut query, Self::table_def(), if_exists);
        executor.execute(query.into()).map(|v| v.map(|_| ()))
    }

    /// Inserts the record, generated columns are left to the engine unless set.
    fn insert_one<Exec: Executor>(
        &self,
        executor: &mut Exec,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        let table = Self::table_def();
        let (columns, values): (Vec<_>, Vec<_>) = self
            .row_filtered()
            .into_vec()
            .into_iter()
            .filter(|(name, value)| {
                table
                    .find_column(name)
                    .is_some_and(|c| !(c.generated && value.is_null()))
            })
            .unzip();
        let mut query = String::with_capacity(256);
        executor
            .driver()
            .sql_writer()
            .write_insert(&mut query, table, &columns);
        execute_bound(executor, query, values)
    }

    fn find_pk<Exec: Executor>(
        executor: &mut Exec,
        primary_key: Row,
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        let condition = Self::table_def().key_condition(primary_key);
        async move {
            let condition = condition?;
            Self::find_one(executor, &condition).await
        }
    }

    fn find_one<Exec: Executor, Expr: Expression>(
        executor: &mut Exec,
        condition: &Expr,
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        let stream = Self::find_many(executor, condition, Some(1));
        async move { pin!(stream).into_future().map(|(v, _)| v).await.transpose() }
    }

    fn find_many<Exec: Executor, Expr: Expression>(
        executor: &mut Exec,
        condition: &Expr,
        limit: Option<u32>,
    ) -> impl Stream<Item = Result<Self>> + Send {
        let mut query = String::with_capacity(256);
        executor.driver().sql_writer().write_select(
            &mut query,
            Self::table_def(),
            condition,
            limit,
        );
        executor
            .fetch(query.into())
            .map(|row| row.and_then(Self::from_row))
    }

    /// Writes every updatable column of the record to the row with the same primary key.
    fn update_one<Exec: Executor>(
        &self,
        executor: &mut Exec,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        let table = Self::table_def();
        let (columns, values): (Vec<_>, Vec<_>) = self
            .row_filtered()
            .into_vec()
            .into_iter()
            .filter(|(name, _)| table.find_column(name).is_some_and(ColumnDef::is_updatable))
            .unzip();
        let query = table.key_condition(self.primary_key()).map(|condition| {
            let mut query = String::with_capacity(256);
            executor
                .driver()
                .sql_writer()
                .write_update(&mut query, table, &columns, &condition);
            query
        });
        async move { execute_bound(executor, query?, values).await }
    }

    /// Inserts the record or, when it collides with the conflict target, updates the existing row.
    fn upsert_one<Exec: Executor>(
        &self,
        executor: &mut Exec,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        let table = Self::table_def();
        let (columns, values): (Vec<_>, Vec<_>) = self
            .row_filtered()
            .into_vec()
            .into_iter()
            .filter(|(name, value)| {
                table
                    .find_column(name)
                    .is_some_and(|c| !(c.generated && value.is_null()))
            })
            .unzip();
        let mut query = String::with_capacity(256);
        executor.driver().sql_writer().write_upsert(
            &mut query,
            table,
            &columns,
            &table.conflict_target(),
        );
        execute_bound(executor, query, values)
    }

    fn delete_one<Exec: Executor>(
        executor: &mut Exec,
        primary_key: Row,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        let condition = Self::table_def().key_condition(primary_key);
        async move {
            let condition = condition?;
            Self::delete_many(executor, &condition).await
        }
    }

    fn delete_many<Exec: Executor, Expr: Expression>(
        executor: &mut Exec,
        condition: &Expr,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        let mut query = String::with_capacity(128);
        executor
            .driver()
            .sql_writer()
            .write_delete(&mut query, Self::table_def(), condition);
        executor.execute(query.into())
    }

    /// Deletes the row of this record, fails unless exactly one row was removed.
    fn delete<Exec: Executor>(&self, executor: &mut Exec) -> impl Future<Output = Result<()>> + Send {
        Self::delete_one(executor, self.primary_key()).map(|v| {
            v.and_then(|v| {
                if v.rows_affected == 1 {
                    Ok(())
                } else {
                    let error = Error::msg(format!(
                        "The query deleted {} rows instead of the expected 1",
                        v.rows_affected
                    ));
                    log::log!(
                        if v.rows_affected == 0 {
                            Level::Info
                        } else {
                            Level::Error
                        },
                        "{}",
                        error
                    );
                    Err(error)
                }
            })
        })
    }
}

/// Prepares `query`, binds `values` in order and executes it.
pub async fn execute_bound<Exec: Executor>(
    executor: &mut Exec,
    query: String,
    values: Vec<Value>,
) -> Result<RowsAffected> {
    let mut query = executor.prepare(query).await?;
    for value in values {
        query.bind(value)?;
    }
    executor.execute(query).await
}
