mod cbox;
mod connection;
mod driver;
mod extract;
mod prepared;
mod sql_writer;
mod transaction;

use journal_core::{ConstraintError, Error};
use libsqlite3_sys::{
    SQLITE_CONSTRAINT, SQLITE_CONSTRAINT_CHECK, SQLITE_CONSTRAINT_FOREIGNKEY,
    SQLITE_CONSTRAINT_NOTNULL, SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_ROWID,
    SQLITE_CONSTRAINT_UNIQUE, sqlite3, sqlite3_errmsg, sqlite3_extended_errcode,
};
use std::{
    ffi::{CStr, c_char},
    ptr,
};

pub(crate) use cbox::*;
pub use connection::*;
pub use driver::*;
pub use prepared::*;
pub use sql_writer::*;
pub use transaction::*;

pub(crate) fn error_message_from_ptr(ptr: &'_ *const c_char) -> &'_ str {
    unsafe {
        if *ptr != ptr::null() {
            CStr::from_ptr(*ptr)
                .to_str()
                .unwrap_or("Unknown error (the error message was not a valid C string)")
        } else {
            "Unknown error (could not extract the error message)"
        }
    }
}

/// Error describing the last failure of `connection`, constraint failures carry a [`ConstraintError`].
pub(crate) fn error_from_connection(connection: *mut sqlite3) -> Error {
    let (code, message) = unsafe {
        (
            sqlite3_extended_errcode(connection),
            error_message_from_ptr(&sqlite3_errmsg(connection)).to_string(),
        )
    };
    let constraint = match code {
        SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY | SQLITE_CONSTRAINT_ROWID => {
            ConstraintError::UniqueConstraintViolation { message }
        }
        SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintError::ForeignKeyViolation { message },
        SQLITE_CONSTRAINT_CHECK | SQLITE_CONSTRAINT_NOTNULL => {
            ConstraintError::ConstraintViolation { message }
        }
        _ if code & 0xff == SQLITE_CONSTRAINT => ConstraintError::ConstraintViolation { message },
        _ => {
            let error = Error::msg(format!("{} (sqlite error code {})", message, code));
            log::error!("{}", error);
            return error;
        }
    };
    log::warn!("{}", constraint);
    Error::new(constraint)
}
