use crate::{
    BinaryOp, BinaryOpType, ColumnDef, ColumnRef, Error, Expression, Operand, Result, Row, Value,
};
use std::{borrow::Cow, collections::HashSet};

/// Reference to a table.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: &'static str,
    pub schema: &'static str,
}

impl TableRef {
    pub fn full_name(&self) -> String {
        let mut result = String::new();
        if !self.schema.is_empty() {
            result.push_str(self.schema);
            result.push('.');
        }
        result.push_str(self.name);
        result
    }
}

/// Index over one or more columns of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: Cow<'static, str>,
    pub columns: Vec<&'static str>,
    pub unique: bool,
}

/// Explicit description of a table: columns, constraints and indexes.
///
/// It is consumed by [`SqlWriter`](crate::SqlWriter) to render the `CREATE`
/// statements and by [`Entity`](crate::Entity) to render queries.
///
/// ```rust
/// use journal_core::{ColumnDef, DefaultValue, TableDef, Value};
/// let table = TableDef::new("Notes")
///     .column(ColumnDef::new("Id", Value::Int64(None)).primary_key().generated())
///     .column(ColumnDef::new("Body", Value::Varchar(None)).max_length(200))
///     .column(
///         ColumnDef::new("CreatedAt", Value::Timestamp(None))
///             .default(DefaultValue::CurrentTimestamp),
///     );
/// assert!(table.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableDef {
    pub table_ref: TableRef,
    pub columns: Vec<ColumnDef>,
    pub indexes: Vec<IndexDef>,
}

impl TableDef {
    pub fn new(name: &'static str) -> Self {
        Self {
            table_ref: TableRef { name, schema: "" },
            ..Default::default()
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Unique index named `IX_<Table>_<Columns>`.
    pub fn unique_index(self, columns: &[&'static str]) -> Self {
        let name = self.index_name(columns);
        self.named_index(name, columns, true)
    }

    /// Non unique index named `IX_<Table>_<Columns>`.
    pub fn index(self, columns: &[&'static str]) -> Self {
        let name = self.index_name(columns);
        self.named_index(name, columns, false)
    }

    pub fn named_index(
        mut self,
        name: impl Into<Cow<'static, str>>,
        columns: &[&'static str],
        unique: bool,
    ) -> Self {
        self.indexes.push(IndexDef {
            name: name.into(),
            columns: columns.to_vec(),
            unique,
        });
        self
    }

    fn index_name(&self, columns: &[&'static str]) -> String {
        let mut name = format!("IX_{}", self.table_ref.name);
        for column in columns {
            name.push('_');
            name.push_str(column);
        }
        name
    }

    pub fn name(&self) -> &'static str {
        self.table_ref.name
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_ref(&self, name: &'static str) -> ColumnRef {
        ColumnRef {
            name,
            table: self.table_ref.name,
        }
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.is_primary_key())
    }

    pub fn unique_indexes(&self) -> impl Iterator<Item = &IndexDef> {
        self.indexes.iter().filter(|i| i.unique)
    }

    /// Columns an upsert conflicts on: the first unique index, otherwise the primary key.
    pub fn conflict_target(&self) -> Vec<&'static str> {
        match self.unique_indexes().next() {
            Some(index) => index.columns.clone(),
            None => self.primary_key().map(|c| c.name).collect(),
        }
    }

    /// Condition matching the row identified by `key` (primary key values, in column order).
    pub fn key_condition(&self, key: Row) -> Result<Box<dyn Expression>> {
        let columns = self.primary_key().collect::<Vec<_>>();
        if columns.len() != key.len() {
            return Err(Error::msg(format!(
                "Table `{}` has a primary key of {} columns but {} values were provided",
                self.table_ref.full_name(),
                columns.len(),
                key.len()
            )));
        }
        let mut condition: Option<Box<dyn Expression>> = None;
        for (column, value) in columns.into_iter().zip(key.into_vec()) {
            if value.is_null() {
                return Err(Error::msg(format!(
                    "The primary key column `{}` of `{}` has no value",
                    column.name,
                    self.table_ref.full_name(),
                )));
            }
            let term: Box<dyn Expression> = Box::new(BinaryOp {
                op: BinaryOpType::Equal,
                lhs: Operand::Column(self.column_ref(column.name)),
                rhs: Operand::Variable(value),
            });
            condition = Some(match condition {
                Some(lhs) => Box::new(BinaryOp {
                    op: BinaryOpType::And,
                    lhs,
                    rhs: term,
                }),
                None => term,
            });
        }
        condition.ok_or_else(|| {
            Error::msg(format!(
                "Table `{}` does not have a primary key",
                self.table_ref.full_name()
            ))
        })
    }

    /// Checks the definition is consistent before it is rendered or applied.
    pub fn validate(&self) -> Result<()> {
        let table = self.table_ref.full_name();
        if self.table_ref.name.is_empty() {
            return Err(Error::msg("The table name cannot be empty"));
        }
        if self.columns.is_empty() {
            return Err(Error::msg(format!("Table `{}` has no columns", table)));
        }
        let mut names = HashSet::new();
        for column in &self.columns {
            if !names.insert(column.name) {
                return Err(Error::msg(format!(
                    "Column `{}` is declared more than once in `{}`",
                    column.name, table
                )));
            }
            if matches!(column.value, Value::Null) {
                return Err(Error::msg(format!(
                    "Column `{}` of `{}` does not have a type",
                    column.name, table
                )));
            }
            if column.max_length.is_some() && !matches!(column.value, Value::Varchar(..)) {
                return Err(Error::msg(format!(
                    "Column `{}` of `{}` has a maximum length but it is not a text column",
                    column.name, table
                )));
            }
            if column.generated && !column.is_primary_key() {
                return Err(Error::msg(format!(
                    "Generated column `{}` of `{}` must be part of the primary key",
                    column.name, table
                )));
            }
        }
        if self.columns.iter().filter(|c| c.generated).count() > 1 {
            return Err(Error::msg(format!(
                "Table `{}` has more than one generated column",
                table
            )));
        }
        for index in &self.indexes {
            if index.columns.is_empty() {
                return Err(Error::msg(format!(
                    "Index `{}` of `{}` has no columns",
                    index.name, table
                )));
            }
            if let Some(missing) = index.columns.iter().find(|c| !names.contains(*c)) {
                return Err(Error::msg(format!(
                    "Index `{}` refers to the column `{}` that does not exist in `{}`",
                    index.name, missing, table
                )));
            }
        }
        Ok(())
    }
}
