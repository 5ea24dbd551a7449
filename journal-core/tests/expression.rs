#[cfg(test)]
mod tests {
    use journal_core::{
        BinaryOp, BinaryOpType, ColumnDef, ColumnRef, Expression, GenericSqlWriter, Operand,
        TableDef, Value,
    };

    const WRITER: GenericSqlWriter = GenericSqlWriter {};

    fn column(name: &'static str) -> ColumnRef {
        ColumnRef {
            name,
            table: "TradeCustomFields",
        }
    }

    fn render(expression: &impl Expression, qualify: bool) -> String {
        let mut out = String::new();
        expression.write_query(&WRITER, &mut out, qualify);
        out
    }

    #[test]
    fn simple_equals() {
        let condition = column("TradeId").equals(1_i64);
        assert_eq!(render(&condition, false), r#""TradeId" = 1"#);
        assert_eq!(
            render(&condition, true),
            r#""TradeCustomFields"."TradeId" = 1"#
        );
    }

    #[test]
    fn conjunction() {
        let condition = column("TradeId")
            .equals(1_i64)
            .and(column("FieldDefinitionId").equals(2_i64));
        assert_eq!(
            render(&condition, false),
            r#""TradeId" = 1 AND "FieldDefinitionId" = 2"#
        );
    }

    #[test]
    fn precedence() {
        let condition = column("TradeId")
            .equals(1_i64)
            .or(column("TradeId").equals(2_i64))
            .and(column("FieldDefinitionId").equals(3_i64));
        assert_eq!(
            render(&condition, false),
            r#"("TradeId" = 1 OR "TradeId" = 2) AND "FieldDefinitionId" = 3"#
        );
        let condition = column("TradeId").equals(1_i64).and(
            column("FieldDefinitionId")
                .equals(2_i64)
                .or(column("FieldDefinitionId").equals(3_i64)),
        );
        assert_eq!(
            render(&condition, false),
            r#""TradeId" = 1 AND ("FieldDefinitionId" = 2 OR "FieldDefinitionId" = 3)"#
        );
    }

    #[test]
    fn literals() {
        let condition = column("Value").equals("O'Brien \"quoted\"");
        assert_eq!(
            render(&condition, false),
            r#""Value" = 'O''Brien "quoted"'"#
        );
        let condition = BinaryOp {
            op: BinaryOpType::Is,
            lhs: Operand::Column(column("Value")),
            rhs: Operand::Variable(Value::Null),
        };
        assert_eq!(render(&condition, false), r#""Value" IS NULL"#);
        assert_eq!(render(&true, false), "true");
        assert_eq!(render(&Value::Blob(Some([0xCA, 0xFE].into())), false), "X'CAFE'");
        assert_eq!(render(&Value::Float64(Some(0.5)), false), "0.5");
    }

    #[test]
    fn key_condition() {
        let table = TableDef::new("Pairs")
            .column(ColumnDef::new("Left", Value::Int64(None)).part_of_primary_key())
            .column(ColumnDef::new("Right", Value::Int64(None)).part_of_primary_key())
            .column(ColumnDef::new("Label", Value::Varchar(None)).nullable());
        let condition = table
            .key_condition([Value::Int64(Some(4)), Value::Int64(Some(9))].into())
            .unwrap();
        assert_eq!(render(&condition, false), r#""Left" = 4 AND "Right" = 9"#);
        assert!(table.key_condition([Value::Int64(Some(4))].into()).is_err());
        assert!(
            table
                .key_condition([Value::Int64(Some(4)), Value::Int64(None)].into())
                .is_err()
        );
        assert_eq!(table.conflict_target(), ["Left", "Right"]);
    }
}
