use time::PrimitiveDateTime;

/// Dynamically typed value moved between entities, queries and drivers.
///
/// A variant holding `None` still carries its type, this is how column
/// definitions describe the SQL type of a column.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float64(Option<f64>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Timestamp(Option<PrimitiveDateTime>),
}

impl Value {
    /// True for `Null` and for every typed variant without a value.
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Boolean(None)
                | Value::Int32(None)
                | Value::Int64(None)
                | Value::Float64(None)
                | Value::Varchar(None)
                | Value::Blob(None)
                | Value::Timestamp(None)
        )
    }
}
