use crate::{ColumnRef, SqlWriter, Value};
use std::fmt::Debug;

pub trait OpPrecedence {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32;
}

/// A renderable SQL expression node.
pub trait Expression: OpPrecedence + Send + Sync + Debug {
    /// Serialize the expression into the output string using the sql writer.
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool);
}

impl<T: OpPrecedence + ?Sized> OpPrecedence for &T {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32 {
        (*self).precedence(writer)
    }
}

impl<T: Expression + ?Sized> Expression for &T {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool) {
        (*self).write_query(writer, out, qualify_columns);
    }
}

impl OpPrecedence for Box<dyn Expression> {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32 {
        (**self).precedence(writer)
    }
}

impl Expression for Box<dyn Expression> {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool) {
        (**self).write_query(writer, out, qualify_columns);
    }
}

impl OpPrecedence for bool {
    fn precedence(&self, _writer: &dyn SqlWriter) -> i32 {
        1_000_000
    }
}

impl Expression for bool {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, _qualify_columns: bool) {
        writer.write_value_bool(out, *self);
    }
}

impl OpPrecedence for Value {
    fn precedence(&self, _writer: &dyn SqlWriter) -> i32 {
        1_000_000
    }
}

impl Expression for Value {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, _qualify_columns: bool) {
        writer.write_value(out, self);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(ColumnRef),
    Variable(Value),
}

impl OpPrecedence for Operand {
    fn precedence(&self, _writer: &dyn SqlWriter) -> i32 {
        1_000_000
    }
}

impl Expression for Operand {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool) {
        writer.write_expression_operand(out, self, qualify_columns);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpType {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Is,
    IsNot,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp<L: Expression, R: Expression> {
    pub op: BinaryOpType,
    pub lhs: L,
    pub rhs: R,
}

impl<L: Expression, R: Expression> BinaryOp<L, R> {
    pub fn and<E: Expression>(self, rhs: E) -> BinaryOp<Self, E> {
        BinaryOp {
            op: BinaryOpType::And,
            lhs: self,
            rhs,
        }
    }
    pub fn or<E: Expression>(self, rhs: E) -> BinaryOp<Self, E> {
        BinaryOp {
            op: BinaryOpType::Or,
            lhs: self,
            rhs,
        }
    }
}

impl<L: Expression, R: Expression> OpPrecedence for BinaryOp<L, R> {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32 {
        writer.expression_binary_op_precedence(&self.op)
    }
}

impl<L: Expression, R: Expression> Expression for BinaryOp<L, R> {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool) {
        writer.write_expression_binary_op(
            out,
            &BinaryOp {
                op: self.op,
                lhs: &self.lhs as &dyn Expression,
                rhs: &self.rhs as &dyn Expression,
            },
            qualify_columns,
        )
    }
}
