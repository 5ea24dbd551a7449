use crate::{
    CBox, SqliteDriver, SqlitePrepared, SqliteTransaction, error_from_connection,
    extract::{extract_name, extract_value},
};
use async_stream::try_stream;
use journal_core::{
    Connection, Context, Driver, Error, Executor, Query, QueryResult, Result, RowLabeled,
    RowNames, RowsAffected, stream::Stream, truncate_long,
};
use libsqlite3_sys::{
    SQLITE_DBCONFIG_DQS_DDL, SQLITE_DBCONFIG_DQS_DML, SQLITE_DONE, SQLITE_OK, SQLITE_OPEN_CREATE,
    SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI, SQLITE_ROW, sqlite3, sqlite3_changes64,
    sqlite3_column_count, sqlite3_db_config, sqlite3_extended_result_codes,
    sqlite3_finalize, sqlite3_last_insert_rowid, sqlite3_open_v2, sqlite3_prepare_v2,
    sqlite3_step, sqlite3_stmt, sqlite3_stmt_readonly, sqlite3_total_changes64,
};
use std::{
    borrow::Cow,
    ffi::{CString, c_char, c_int},
    ptr,
    sync::Arc,
};
use tokio::task::spawn_blocking;

// libsqlite3-sys blocklists this function from its generated bindings, but the
// symbol is present in the linked SQLite library.
unsafe extern "C" {
    fn sqlite3_close_v2(db: *mut sqlite3) -> c_int;
}

fn close_connection(connection: *mut sqlite3) {
    unsafe {
        sqlite3_close_v2(connection);
    }
}

fn finalize_statement(statement: *mut sqlite3_stmt) {
    unsafe {
        sqlite3_finalize(statement);
    }
}

/// Connection to a SQLite database file (or an in-memory database).
///
/// Every call into SQLite runs on the blocking thread pool of tokio.
pub struct SqliteConnection {
    pub(crate) connection: Arc<CBox<*mut sqlite3>>,
}

impl SqliteConnection {
    /// Steps `statement` to completion, collecting its rows and, for statements
    /// that write, the number of rows changed.
    fn step_statement(
        connection: *mut sqlite3,
        statement: *mut sqlite3_stmt,
    ) -> Result<Vec<QueryResult>> {
        unsafe {
            let count = sqlite3_column_count(statement);
            let labels = (0..count)
                .map(|i| extract_name(statement, i))
                .collect::<Result<RowNames>>()?;
            let total_changes = sqlite3_total_changes64(connection);
            let last_rowid = sqlite3_last_insert_rowid(connection);
            let mut results = Vec::new();
            loop {
                match sqlite3_step(statement) {
                    SQLITE_ROW => results.push(QueryResult::Row(RowLabeled::new(
                        labels.clone(),
                        (0..count)
                            .map(|i| extract_value(statement, i))
                            .collect::<Result<_>>()?,
                    ))),
                    SQLITE_DONE => break,
                    _ => return Err(error_from_connection(connection)),
                }
            }
            if sqlite3_stmt_readonly(statement) == 0 {
                let changed = sqlite3_total_changes64(connection) != total_changes;
                let rowid = sqlite3_last_insert_rowid(connection);
                results.push(QueryResult::Affected(RowsAffected {
                    // Only the top level statement, rows removed by a cascade are not counted
                    rows_affected: if changed {
                        sqlite3_changes64(connection) as u64
                    } else {
                        0
                    },
                    last_affected_id: (changed && rowid != last_rowid).then_some(rowid),
                }));
            }
            Ok(results)
        }
    }

    /// Prepares and runs every statement contained in `sql`.
    fn run_unprepared(connection: *mut sqlite3, sql: &str) -> Result<Vec<QueryResult>> {
        let mut results = Vec::new();
        let mut rest = sql;
        while !rest.trim().is_empty() {
            let mut statement = CBox::new(ptr::null_mut(), finalize_statement);
            let mut tail: *const c_char = ptr::null();
            let rc = unsafe {
                sqlite3_prepare_v2(
                    connection,
                    rest.as_ptr() as *const c_char,
                    rest.len() as c_int,
                    &mut *statement,
                    &mut tail,
                )
            };
            if rc != SQLITE_OK {
                return Err(error_from_connection(connection));
            }
            let consumed = if tail.is_null() {
                rest.len()
            } else {
                tail as usize - rest.as_ptr() as usize
            };
            if consumed == 0 {
                break;
            }
            rest = rest.get(consumed..).unwrap_or_default();
            if statement.is_null() {
                // Comment or empty statement
                continue;
            }
            results.extend(Self::step_statement(connection, *statement)?);
        }
        Ok(results)
    }
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &Self::Driver {
        &SqliteDriver {}
    }

    async fn prepare(&mut self, query: String) -> Result<Query<SqliteDriver>> {
        let connection = self.connection.clone();
        let context = format!("While preparing the query:\n{}", truncate_long!(query));
        let statement = spawn_blocking(move || unsafe {
            let connection = **connection;
            let mut statement = CBox::new(ptr::null_mut(), finalize_statement);
            let mut tail: *const c_char = ptr::null();
            let rc = sqlite3_prepare_v2(
                connection,
                query.as_ptr() as *const c_char,
                query.len() as c_int,
                &mut *statement,
                &mut tail,
            );
            if rc != SQLITE_OK {
                return Err(error_from_connection(connection));
            }
            if statement.is_null() {
                return Err(Error::msg("The query does not contain any statement"));
            }
            let consumed = if tail.is_null() {
                query.len()
            } else {
                tail as usize - query.as_ptr() as usize
            };
            if !query.get(consumed..).unwrap_or_default().trim().is_empty() {
                return Err(Error::msg(
                    "Cannot prepare more than one statement at a time",
                ));
            }
            Ok(statement)
        })
        .await
        .map_err(Error::new)
        .and_then(|v| v)
        .context(context)?;
        Ok(Query::Prepared(SqlitePrepared::new(statement)))
    }

    fn run(&mut self, query: Query<SqliteDriver>) -> impl Stream<Item = Result<QueryResult>> + Send {
        let connection = self.connection.clone();
        try_stream! {
            log::debug!("Executing: {}", query);
            let context = format!("While executing the query:\n{}", query);
            let results = spawn_blocking(move || {
                let connection = **connection;
                match query {
                    Query::Raw(sql) => Self::run_unprepared(connection, &sql),
                    Query::Prepared(prepared) => {
                        Self::step_statement(connection, *prepared.statement)
                    }
                }
            })
            .await
            .map_err(Error::new)
            .and_then(|v| v)
            .context(context)?;
            for result in results {
                yield result;
            }
        }
    }
}

impl Connection for SqliteConnection {
    /// Opens `sqlite://<path>[?<uri params>]` as a `file:` URI.
    ///
    /// Foreign key enforcement and the busy timeout keep the engine defaults,
    /// `JournalConfig::connect` sets them. Double quotes always denote
    /// identifiers: a quoted unknown column is an error, not a string literal.
    async fn connect(url: Cow<'static, str>) -> Result<SqliteConnection> {
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`, found `{}`",
                prefix, url
            ));
            log::error!("{}", error);
            return Err(error);
        };
        let context = format!("While opening the database `{}`", url);
        let location = CString::new(format!("file:{}", location)).context(context.clone())?;
        let connection = spawn_blocking(move || unsafe {
            let mut connection = CBox::new(ptr::null_mut(), close_connection);
            let rc = sqlite3_open_v2(
                location.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            );
            if connection.is_null() {
                return Err(Error::msg("Could not allocate the connection"));
            }
            sqlite3_extended_result_codes(*connection, 1);
            if rc != SQLITE_OK {
                return Err(error_from_connection(*connection));
            }
            for option in [SQLITE_DBCONFIG_DQS_DML, SQLITE_DBCONFIG_DQS_DDL] {
                let rc =
                    sqlite3_db_config(*connection, option, 0 as c_int, ptr::null_mut::<c_int>());
                if rc != SQLITE_OK {
                    return Err(error_from_connection(*connection));
                }
            }
            Ok(connection)
        })
        .await
        .map_err(Error::new)
        .and_then(|v| v)
        .context(context)?;
        log::debug!("Connected to {}", url);
        Ok(Self {
            connection: Arc::new(connection),
        })
    }

    fn begin(&mut self) -> impl Future<Output = Result<SqliteTransaction<'_>>> + Send {
        SqliteTransaction::new(self)
    }
}
