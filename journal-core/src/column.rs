use crate::{AsValue, BinaryOp, BinaryOpType, Expression, OpPrecedence, Operand, SqlWriter, Value};

/// Fully qualified reference to a table column.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    /// Column name.
    pub name: &'static str,
    /// Table name.
    pub table: &'static str,
}

impl ColumnRef {
    pub fn equals(self, value: impl AsValue) -> BinaryOp<Operand, Operand> {
        BinaryOp {
            op: BinaryOpType::Equal,
            lhs: Operand::Column(self),
            rhs: Operand::Variable(value.as_value()),
        }
    }
}

impl OpPrecedence for ColumnRef {
    fn precedence(&self, _writer: &dyn SqlWriter) -> i32 {
        1_000_000
    }
}

impl Expression for ColumnRef {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool) {
        writer.write_column_ref(out, self, qualify_columns);
    }
}

/// Indicates how (or if) a column participates in the primary key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyType {
    /// Single-column primary key.
    PrimaryKey,
    /// Member of a composite primary key.
    PartOfPrimaryKey,
    /// Not part of the primary key.
    #[default]
    None,
}

/// Referential action for foreign key updates / deletes.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No special action.
    #[default]
    NoAction,
    /// Reject the operation.
    Restrict,
    /// Propagate delete/update.
    Cascade,
    /// Set referencing columns to NULL.
    SetNull,
    /// Apply column DEFAULT.
    SetDefault,
}

/// Value computed by the storage engine when the caller does not supply one.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// The engine clock at statement time.
    CurrentTimestamp,
    /// A constant.
    Value(Value),
}

/// Declarative specification of a table column.
#[derive(Default, Debug, Clone)]
pub struct ColumnDef {
    /// Column name.
    pub name: &'static str,
    /// `Value` variant describing the column type.
    pub value: Value,
    /// Nullability flag.
    pub nullable: bool,
    /// Default assigned by the engine on insert.
    pub default: Option<DefaultValue>,
    /// Primary key participation.
    pub primary_key: PrimaryKeyType,
    /// Identity assigned by the engine, never sent on insert.
    pub generated: bool,
    /// Maximum length in characters, enforced by the engine.
    pub max_length: Option<u32>,
    /// Unique constraint (single column only, composite handled by an `IndexDef`).
    pub unique: bool,
    /// Never written by updates once the row exists.
    pub immutable: bool,
    /// Value assigned by the engine on every update.
    pub update_default: Option<DefaultValue>,
    /// Foreign key target column.
    pub references: Option<ColumnRef>,
    /// Action for deletes.
    pub on_delete: Option<Action>,
    /// Optional human-readable comment.
    pub comment: &'static str,
}

impl ColumnDef {
    /// Non nullable column of the type described by `value`.
    pub fn new(name: &'static str, value: Value) -> Self {
        Self {
            name,
            value,
            ..Default::default()
        }
    }
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
    pub fn primary_key(mut self) -> Self {
        self.primary_key = PrimaryKeyType::PrimaryKey;
        self
    }
    pub fn part_of_primary_key(mut self) -> Self {
        self.primary_key = PrimaryKeyType::PartOfPrimaryKey;
        self
    }
    pub fn generated(mut self) -> Self {
        self.generated = true;
        self.immutable = true;
        self
    }
    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }
    pub fn default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }
    pub fn update_default(mut self, value: DefaultValue) -> Self {
        self.update_default = Some(value);
        self
    }
    pub fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some(ColumnRef {
            name: column,
            table,
        });
        self
    }
    pub fn on_delete(mut self, action: Action) -> Self {
        self.on_delete = Some(action);
        self
    }
    pub fn comment(mut self, comment: &'static str) -> Self {
        self.comment = comment;
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key != PrimaryKeyType::None
    }

    /// Whether an `UPDATE` may assign this column from a caller supplied value.
    pub fn is_updatable(&self) -> bool {
        !self.immutable && !self.is_primary_key() && self.update_default.is_none()
    }
}
