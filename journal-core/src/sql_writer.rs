use crate::{
    Action, BinaryOp, BinaryOpType, ColumnDef, ColumnRef, DefaultValue, Expression, IndexDef,
    Operand, PrimaryKeyType, TableDef, TableRef, Value, possibly_parenthesized, separated_by,
    write_timestamp,
};
use std::{fmt::Write, time::Duration};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($this:ident, $out:ident, $value:expr) => {{
        if $value.is_finite() {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format($value));
        } else if $value.is_nan() {
            $this.write_value_string($out, "NaN");
        } else if $value.is_sign_positive() {
            $this.write_value_string($out, "Infinity");
        } else {
            $this.write_value_string($out, "-Infinity");
        }
    }};
}

/// Renders statements in a SQL dialect.
///
/// Every method has a default producing standard SQL, drivers override the
/// fragments their engine spells differently. All methods append to `out`.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    fn write_table_ref(&self, out: &mut String, value: &TableRef) {
        if !value.schema.is_empty() {
            self.write_identifier_quoted(out, value.schema);
            out.push('.');
        }
        self.write_identifier_quoted(out, value.name);
    }

    fn write_column_ref(&self, out: &mut String, value: &ColumnRef, qualify: bool) {
        if qualify && !value.table.is_empty() {
            self.write_identifier_quoted(out, value.table);
            out.push('.');
        }
        self.write_identifier_quoted(out, value.name);
    }

    fn write_column_type(&self, out: &mut String, value: &Value, max_length: Option<u32>) {
        match value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::Float64(..) => out.push_str("DOUBLE"),
            Value::Varchar(..) => match max_length {
                Some(length) => {
                    out.push_str("VARCHAR(");
                    write_integer!(out, length);
                    out.push(')');
                }
                None => out.push_str("VARCHAR"),
            },
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Timestamp(..) => out.push_str("TIMESTAMP"),
            Value::Null => out.push_str("NULL"),
        };
    }

    fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            Value::Null
            | Value::Boolean(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::Float64(None)
            | Value::Varchar(None)
            | Value::Blob(None)
            | Value::Timestamp(None) => self.write_value_none(out),
            Value::Boolean(Some(v)) => self.write_value_bool(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::Float64(Some(v)) => write_float!(self, out, *v),
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => self.write_value_blob(out, v),
            Value::Timestamp(Some(v)) => {
                out.push('\'');
                write_timestamp(out, v, ' ');
                out.push('\'');
            }
        };
    }

    fn write_value_none(&self, out: &mut String) {
        out.push_str("NULL")
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize])
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        for b in value {
            let _ = write!(out, "{:02X}", b);
        }
        out.push('\'');
    }

    fn write_default(&self, out: &mut String, value: &DefaultValue) {
        match value {
            DefaultValue::CurrentTimestamp => out.push_str("CURRENT_TIMESTAMP"),
            DefaultValue::Value(v) => self.write_value(out, v),
        }
    }

    fn write_action(&self, out: &mut String, action: &Action) {
        out.push_str(match action {
            Action::NoAction => "NO ACTION",
            Action::Restrict => "RESTRICT",
            Action::Cascade => "CASCADE",
            Action::SetNull => "SET NULL",
            Action::SetDefault => "SET DEFAULT",
        });
    }

    fn write_placeholder(&self, out: &mut String, _index: usize) {
        out.push('?');
    }

    fn expression_binary_op_precedence(&self, value: &BinaryOpType) -> i32 {
        match value {
            BinaryOpType::Or => 100,
            BinaryOpType::And => 200,
            BinaryOpType::Equal => 300,
            BinaryOpType::NotEqual => 300,
            BinaryOpType::Less => 300,
            BinaryOpType::Greater => 300,
            BinaryOpType::LessEqual => 300,
            BinaryOpType::GreaterEqual => 300,
            BinaryOpType::Is => 400,
            BinaryOpType::IsNot => 400,
        }
    }

    fn write_expression_operand(&self, out: &mut String, value: &Operand, qualify_columns: bool) {
        match value {
            Operand::Column(v) => self.write_column_ref(out, v, qualify_columns),
            Operand::Variable(v) => self.write_value(out, v),
        };
    }

    fn write_expression_binary_op(
        &self,
        out: &mut String,
        value: &BinaryOp<&dyn Expression, &dyn Expression>,
        qualify_columns: bool,
    ) {
        let infix = match value.op {
            BinaryOpType::Equal => " = ",
            BinaryOpType::NotEqual => " != ",
            BinaryOpType::Less => " < ",
            BinaryOpType::Greater => " > ",
            BinaryOpType::LessEqual => " <= ",
            BinaryOpType::GreaterEqual => " >= ",
            BinaryOpType::Is => " IS ",
            BinaryOpType::IsNot => " IS NOT ",
            BinaryOpType::And => " AND ",
            BinaryOpType::Or => " OR ",
        };
        let precedence = self.expression_binary_op_precedence(&value.op);
        possibly_parenthesized!(
            out,
            value.lhs.precedence(self.as_dyn()) < precedence,
            value.lhs.write_query(self.as_dyn(), out, qualify_columns)
        );
        out.push_str(infix);
        possibly_parenthesized!(
            out,
            value.rhs.precedence(self.as_dyn()) <= precedence,
            value.rhs.write_query(self.as_dyn(), out, qualify_columns)
        );
    }

    /// `CREATE TABLE` followed by one `CREATE INDEX` per index of the table.
    fn write_create_table(&self, out: &mut String, table: &TableDef, if_not_exists: bool) {
        out.push_str("CREATE TABLE ");
        if if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_table_ref(out, &table.table_ref);
        out.push_str(" (\n");
        separated_by(
            out,
            &table.columns,
            |out, v| self.write_create_table_column_fragment(out, table, v),
            ",\n",
        );
        let primary_key = table.primary_key().collect::<Vec<_>>();
        if primary_key.len() > 1 {
            out.push_str(",\nPRIMARY KEY (");
            separated_by(
                out,
                primary_key,
                |out, v| self.write_identifier_quoted(out, v.name),
                ", ",
            );
            out.push(')');
        }
        out.push_str("\n);");
        for index in &table.indexes {
            out.push('\n');
            self.write_create_index(out, table, index, if_not_exists);
        }
        self.write_column_comments(out, table);
    }

    fn write_create_table_column_fragment(
        &self,
        out: &mut String,
        table: &TableDef,
        column: &ColumnDef,
    ) {
        self.write_identifier_quoted(out, column.name);
        out.push(' ');
        self.write_column_type(out, &column.value, column.max_length);
        let inline_primary_key =
            column.primary_key == PrimaryKeyType::PrimaryKey && table.primary_key().count() == 1;
        if !column.nullable && !inline_primary_key {
            out.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            out.push_str(" DEFAULT ");
            self.write_default(out, default);
        }
        if inline_primary_key {
            out.push_str(" PRIMARY KEY");
            if column.generated {
                self.write_column_generated(out);
            }
        }
        if column.unique && column.primary_key != PrimaryKeyType::PrimaryKey {
            out.push_str(" UNIQUE");
        }
        if let Some(max_length) = column.max_length {
            out.push(' ');
            self.write_length_check(out, column.name, max_length);
        }
        if let Some(references) = &column.references {
            out.push_str(" REFERENCES ");
            self.write_identifier_quoted(out, references.table);
            out.push('(');
            self.write_identifier_quoted(out, references.name);
            out.push(')');
            if let Some(action) = &column.on_delete {
                out.push_str(" ON DELETE ");
                self.write_action(out, action);
            }
        }
    }

    /// Identity clause following `PRIMARY KEY`.
    fn write_column_generated(&self, out: &mut String) {
        out.push_str(" GENERATED BY DEFAULT AS IDENTITY");
    }

    fn write_length_check(&self, out: &mut String, column: &str, max_length: u32) {
        out.push_str("CHECK (CHAR_LENGTH(");
        self.write_identifier_quoted(out, column);
        out.push_str(") <= ");
        write_integer!(out, max_length);
        out.push(')');
    }

    fn write_create_index(
        &self,
        out: &mut String,
        table: &TableDef,
        index: &IndexDef,
        if_not_exists: bool,
    ) {
        out.push_str("CREATE ");
        if index.unique {
            out.push_str("UNIQUE ");
        }
        out.push_str("INDEX ");
        if if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_identifier_quoted(out, &index.name);
        out.push_str(" ON ");
        self.write_table_ref(out, &table.table_ref);
        out.push_str(" (");
        separated_by(
            out,
            &index.columns,
            |out, v| self.write_identifier_quoted(out, v),
            ", ",
        );
        out.push_str(");");
    }

    fn write_column_comments(&self, out: &mut String, table: &TableDef) {
        for c in table.columns.iter().filter(|c| !c.comment.is_empty()) {
            out.push_str("\nCOMMENT ON COLUMN ");
            self.write_column_ref(out, &table.column_ref(c.name), true);
            out.push_str(" IS ");
            self.write_value_string(out, c.comment);
            out.push(';');
        }
    }

    fn write_drop_table(&self, out: &mut String, table: &TableDef, if_exists: bool) {
        out.push_str("DROP TABLE ");
        if if_exists {
            out.push_str("IF EXISTS ");
        }
        self.write_table_ref(out, &table.table_ref);
        out.push(';');
    }

    /// Every declared column of the rows matching `condition`, ordered by primary key.
    fn write_select(
        &self,
        out: &mut String,
        table: &TableDef,
        condition: &dyn Expression,
        limit: Option<u32>,
    ) {
        out.push_str("SELECT ");
        separated_by(
            out,
            &table.columns,
            |out, v| self.write_identifier_quoted(out, v.name),
            ", ",
        );
        out.push_str("\nFROM ");
        self.write_table_ref(out, &table.table_ref);
        out.push_str("\nWHERE ");
        condition.write_query(self.as_dyn(), out, false);
        let mut primary_key = table.primary_key().peekable();
        if primary_key.peek().is_some() {
            out.push_str("\nORDER BY ");
            separated_by(
                out,
                primary_key,
                |out, v| self.write_identifier_quoted(out, v.name),
                ", ",
            );
        }
        if let Some(limit) = limit {
            out.push_str("\nLIMIT ");
            write_integer!(out, limit);
        }
        out.push(';');
    }

    fn write_insert_fragment(&self, out: &mut String, table: &TableDef, columns: &[&str]) {
        out.push_str("INSERT INTO ");
        self.write_table_ref(out, &table.table_ref);
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, v| self.write_identifier_quoted(out, v),
            ", ",
        );
        out.push_str(") VALUES\n(");
        separated_by(
            out,
            0..columns.len(),
            |out, i| self.write_placeholder(out, i),
            ", ",
        );
        out.push(')');
    }

    /// Single row insert with one placeholder per column.
    fn write_insert(&self, out: &mut String, table: &TableDef, columns: &[&str]) {
        self.write_insert_fragment(out, table, columns);
        out.push(';');
    }

    /// Insert that turns into an update of the existing row when `conflict` collides.
    fn write_upsert(&self, out: &mut String, table: &TableDef, columns: &[&str], conflict: &[&str]) {
        self.write_insert_fragment(out, table, columns);
        out.push_str("\nON CONFLICT (");
        separated_by(
            out,
            conflict,
            |out, v| self.write_identifier_quoted(out, v),
            ", ",
        );
        out.push(')');
        let updated = columns
            .iter()
            .filter(|c| !conflict.contains(*c))
            .filter(|c| table.find_column(c).is_some_and(ColumnDef::is_updatable))
            .collect::<Vec<_>>();
        let defaulted = table
            .columns
            .iter()
            .filter_map(|c| c.update_default.as_ref().map(|d| (c.name, d)))
            .collect::<Vec<_>>();
        if updated.is_empty() && defaulted.is_empty() {
            out.push_str(" DO NOTHING;");
            return;
        }
        out.push_str(" DO UPDATE SET\n");
        separated_by(
            out,
            &updated,
            |out, v| {
                self.write_identifier_quoted(out, v);
                out.push_str(" = EXCLUDED.");
                self.write_identifier_quoted(out, v);
            },
            ",\n",
        );
        let mut separate = !updated.is_empty();
        for (name, default) in defaulted {
            if separate {
                out.push_str(",\n");
            }
            separate = true;
            self.write_identifier_quoted(out, name);
            out.push_str(" = ");
            self.write_default(out, default);
        }
        out.push(';');
    }

    /// Assigns `columns` from placeholders and every `update_default` column from its default.
    fn write_update(
        &self,
        out: &mut String,
        table: &TableDef,
        columns: &[&str],
        condition: &dyn Expression,
    ) {
        out.push_str("UPDATE ");
        self.write_table_ref(out, &table.table_ref);
        out.push_str("\nSET ");
        separated_by(
            out,
            columns.iter().enumerate(),
            |out, (i, v)| {
                self.write_identifier_quoted(out, v);
                out.push_str(" = ");
                self.write_placeholder(out, i);
            },
            ", ",
        );
        let mut separate = !columns.is_empty();
        for column in &table.columns {
            if let Some(default) = &column.update_default {
                if separate {
                    out.push_str(", ");
                }
                separate = true;
                self.write_identifier_quoted(out, column.name);
                out.push_str(" = ");
                self.write_default(out, default);
            }
        }
        out.push_str("\nWHERE ");
        condition.write_query(self.as_dyn(), out, false);
        out.push(';');
    }

    fn write_delete(&self, out: &mut String, table: &TableDef, condition: &dyn Expression) {
        out.push_str("DELETE FROM ");
        self.write_table_ref(out, &table.table_ref);
        out.push_str("\nWHERE ");
        condition.write_query(self.as_dyn(), out, false);
        out.push(';');
    }

    /// Session statement enabling or disabling foreign key enforcement, if the engine needs one.
    fn write_foreign_keys(&self, _out: &mut String, _enabled: bool) {}

    /// Session statement setting how long to wait on a locked database, if the engine needs one.
    fn write_busy_timeout(&self, _out: &mut String, _timeout: Duration) {}

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN;");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT;");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK;");
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;
impl GenericSqlWriter {
    pub fn new() -> Self {
        Self {}
    }
}
impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
