use crate::{CBox, error_from_connection};
use journal_core::{AsValue, Prepared, Result, Value, format_timestamp, truncate_long};
use libsqlite3_sys::*;
use std::{
    ffi::{CStr, c_int},
    fmt::{self, Display},
    os::raw::{c_char, c_void},
};

pub struct SqlitePrepared {
    pub(crate) statement: CBox<*mut sqlite3_stmt>,
    pub(crate) index: u64,
}

impl SqlitePrepared {
    pub(crate) fn new(statement: CBox<*mut sqlite3_stmt>) -> Self {
        Self {
            statement,
            index: 0,
        }
    }

    unsafe fn bind_text(&self, index: c_int, value: &str) -> c_int {
        unsafe {
            sqlite3_bind_text(
                *self.statement,
                index,
                value.as_ptr() as *const c_char,
                value.len() as c_int,
                SQLITE_TRANSIENT(),
            )
        }
    }

    pub(crate) fn sql(&self) -> String {
        unsafe {
            let sql = sqlite3_sql(*self.statement);
            if sql.is_null() {
                return String::new();
            }
            CStr::from_ptr(sql).to_string_lossy().into_owned()
        }
    }
}

impl Prepared for SqlitePrepared {
    fn bind<V: AsValue>(&mut self, value: V) -> Result<&mut Self> {
        self.bind_index(value, self.index)
    }

    fn bind_index<V: AsValue>(&mut self, v: V, index: u64) -> Result<&mut Self> {
        // Sqlite parameters start from 1
        let position = (index + 1) as c_int;
        unsafe {
            let rc = match v.as_value() {
                Value::Null
                | Value::Boolean(None)
                | Value::Int32(None)
                | Value::Int64(None)
                | Value::Float64(None)
                | Value::Varchar(None)
                | Value::Blob(None)
                | Value::Timestamp(None) => sqlite3_bind_null(*self.statement, position),
                Value::Boolean(Some(v)) => sqlite3_bind_int(*self.statement, position, v as c_int),
                Value::Int32(Some(v)) => sqlite3_bind_int(*self.statement, position, v),
                Value::Int64(Some(v)) => sqlite3_bind_int64(*self.statement, position, v),
                Value::Float64(Some(v)) => sqlite3_bind_double(*self.statement, position, v),
                Value::Varchar(Some(v)) => self.bind_text(position, &v),
                Value::Blob(Some(v)) => sqlite3_bind_blob(
                    *self.statement,
                    position,
                    v.as_ptr() as *const c_void,
                    v.len() as c_int,
                    SQLITE_TRANSIENT(),
                ),
                Value::Timestamp(Some(v)) => self.bind_text(position, &format_timestamp(&v)),
            };
            if rc != SQLITE_OK {
                let error = error_from_connection(sqlite3_db_handle(*self.statement)).context(
                    format!(
                        "Cannot bind parameter {} to query:\n{}",
                        position,
                        truncate_long!(self.sql())
                    ),
                );
                log::error!("{:#}", error);
                return Err(error);
            }
        }
        self.index = index + 1;
        Ok(self)
    }
}

impl Display for SqlitePrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql()))
    }
}
