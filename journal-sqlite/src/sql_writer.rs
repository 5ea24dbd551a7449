use journal_core::{SqlWriter, TableDef, Value};
use std::{fmt::Write, time::Duration};

/// SQLite dialect: storage classes instead of SQL types, `AUTOINCREMENT` identities, `PRAGMA` settings.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_column_type(&self, out: &mut String, value: &Value, _max_length: Option<u32>) {
        match value {
            Value::Boolean(..) => out.push_str("INTEGER"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("INTEGER"),
            Value::Float64(..) => out.push_str("REAL"),
            Value::Varchar(..) => out.push_str("TEXT"),
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Timestamp(..) => out.push_str("TEXT"),
            Value::Null => out.push_str("NULL"),
        };
    }

    fn write_column_generated(&self, out: &mut String) {
        out.push_str(" AUTOINCREMENT");
    }

    fn write_length_check(&self, out: &mut String, column: &str, max_length: u32) {
        out.push_str("CHECK (length(");
        self.write_identifier_quoted(out, column);
        let _ = write!(out, ") <= {})", max_length);
    }

    fn write_column_comments(&self, _out: &mut String, _table: &TableDef) {}

    fn write_foreign_keys(&self, out: &mut String, enabled: bool) {
        out.push_str("PRAGMA foreign_keys = ");
        out.push_str(if enabled { "ON" } else { "OFF" });
        out.push(';');
    }

    fn write_busy_timeout(&self, out: &mut String, timeout: Duration) {
        let _ = write!(
            out,
            "PRAGMA busy_timeout = {};",
            timeout.as_millis().min(i32::MAX as u128)
        );
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN IMMEDIATE;");
    }
}
