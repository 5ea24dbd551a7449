use crate::TRADE_CUSTOM_FIELDS;
use journal_core::{
    AsValue, BinaryOp, Connection, Context, Entity, Error, Executor, Operand, Passive, Result,
    Row, RowLabeled, RowsAffected, TableDef, Transaction, Value, stream::TryStreamExt,
};
use std::collections::BTreeMap;
use time::PrimitiveDateTime;

/// Value recorded for one custom field of one trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeCustomField {
    /// Assigned by the engine on insert.
    pub id: Passive<i64>,
    pub trade_id: i64,
    pub field_definition_id: i64,
    pub value: Option<String>,
    /// Assigned by the engine on insert unless set.
    pub created_at: Passive<PrimitiveDateTime>,
    /// Assigned by the engine on every update.
    pub updated_at: Option<PrimitiveDateTime>,
}

impl TradeCustomField {
    pub const ID: &'static str = "Id";
    pub const TRADE_ID: &'static str = "TradeId";
    pub const FIELD_DEFINITION_ID: &'static str = "FieldDefinitionId";
    pub const VALUE: &'static str = "Value";
    pub const CREATED_AT: &'static str = "CreatedAt";
    pub const UPDATED_AT: &'static str = "UpdatedAt";

    pub fn new(trade_id: i64, field_definition_id: i64, value: Option<String>) -> Self {
        Self {
            id: Passive::NotSet,
            trade_id,
            field_definition_id,
            value,
            created_at: Passive::NotSet,
            updated_at: None,
        }
    }

    fn trade_condition(trade_id: i64) -> BinaryOp<Operand, Operand> {
        TRADE_CUSTOM_FIELDS
            .column_ref(Self::TRADE_ID)
            .equals(trade_id)
    }

    fn pair_condition(
        trade_id: i64,
        field_definition_id: i64,
    ) -> BinaryOp<BinaryOp<Operand, Operand>, BinaryOp<Operand, Operand>> {
        Self::trade_condition(trade_id).and(
            TRADE_CUSTOM_FIELDS
                .column_ref(Self::FIELD_DEFINITION_ID)
                .equals(field_definition_id),
        )
    }

    /// Inserts the record and returns the stored row, with `id` and `created_at` assigned.
    ///
    /// Fails with a unique constraint violation when the trade already has a
    /// value for the field definition.
    pub async fn insert<Exec: Executor>(&self, executor: &mut Exec) -> Result<TradeCustomField> {
        let result = self.insert_one(executor).await.with_context(|| {
            format!(
                "While inserting the custom field {} of the trade {}",
                self.field_definition_id, self.trade_id
            )
        })?;
        let stored = match result.last_affected_id.or(self.id.as_option().copied()) {
            Some(id) => Self::find(executor, id).await?,
            None => {
                Self::find_by_pair(executor, self.trade_id, self.field_definition_id).await?
            }
        };
        stored.ok_or_else(|| {
            Error::msg(format!(
                "The custom field {} of the trade {} was not found after being inserted",
                self.field_definition_id, self.trade_id
            ))
        })
    }

    pub async fn find<Exec: Executor>(executor: &mut Exec, id: i64) -> Result<Option<Self>> {
        Self::find_pk(executor, [id.as_value()].into()).await
    }

    pub async fn find_by_pair<Exec: Executor>(
        executor: &mut Exec,
        trade_id: i64,
        field_definition_id: i64,
    ) -> Result<Option<Self>> {
        Self::find_one(executor, &Self::pair_condition(trade_id, field_definition_id)).await
    }

    /// Every custom field of the trade, ordered by id.
    pub async fn for_trade<Exec: Executor>(executor: &mut Exec, trade_id: i64) -> Result<Vec<Self>> {
        Self::find_many(executor, &Self::trade_condition(trade_id), None)
            .try_collect()
            .await
    }

    /// Values of the trade keyed by field definition.
    pub async fn values_for_trade<Exec: Executor>(
        executor: &mut Exec,
        trade_id: i64,
    ) -> Result<BTreeMap<i64, Option<String>>> {
        Ok(Self::for_trade(executor, trade_id)
            .await?
            .into_iter()
            .map(|v| (v.field_definition_id, v.value))
            .collect())
    }

    /// Changes the value, the engine stamps `updated_at`. The record is reloaded afterwards.
    pub async fn update_value<Exec: Executor>(
        &mut self,
        executor: &mut Exec,
        value: Option<String>,
    ) -> Result<()> {
        let previous = std::mem::replace(&mut self.value, value);
        let result = self.save(executor).await;
        if result.is_err() {
            self.value = previous;
        }
        result
    }

    /// Writes `trade_id`, `field_definition_id` and `value` to the stored row and reloads it.
    pub async fn save<Exec: Executor>(&mut self, executor: &mut Exec) -> Result<()> {
        let result = self.update_one(executor).await.with_context(|| {
            format!(
                "While saving the custom field {:?}",
                self.id.as_option()
            )
        })?;
        expect_one_row(&result, "updated")?;
        let id = *self
            .id
            .as_option()
            .ok_or_else(|| Error::msg("Cannot reload a custom field without id"))?;
        *self = Self::find(executor, id).await?.ok_or_else(|| {
            Error::msg(format!(
                "The custom field {} was not found after being saved",
                id
            ))
        })?;
        Ok(())
    }

    /// Records `value` for the pair, replacing the current one if present.
    ///
    /// The check and the write happen in a single statement, concurrent
    /// callers cannot both insert.
    pub async fn upsert<Exec: Executor>(
        executor: &mut Exec,
        trade_id: i64,
        field_definition_id: i64,
        value: Option<String>,
    ) -> Result<TradeCustomField> {
        Self::new(trade_id, field_definition_id, value)
            .upsert_one(executor)
            .await
            .with_context(|| {
                format!(
                    "While upserting the custom field {} of the trade {}",
                    field_definition_id, trade_id
                )
            })?;
        Self::find_by_pair(executor, trade_id, field_definition_id)
            .await?
            .ok_or_else(|| {
                Error::msg(format!(
                    "The custom field {} of the trade {} was not found after being upserted",
                    field_definition_id, trade_id
                ))
            })
    }

    /// Replaces all the values of the trade, pairs without a value are skipped.
    ///
    /// Runs in one transaction: on failure nothing changes.
    pub async fn replace_for_trade<C, It>(
        connection: &mut C,
        trade_id: i64,
        values: It,
    ) -> Result<Vec<TradeCustomField>>
    where
        C: Connection,
        It: IntoIterator<Item = (i64, Option<String>)>,
    {
        let values = values
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| Self::new(trade_id, field, Some(v))))
            .collect::<Vec<_>>();
        let mut transaction = connection.begin().await?;
        let result = async {
            Self::delete_for_trade(&mut transaction, trade_id).await?;
            for value in &values {
                value.insert_one(&mut transaction).await?;
            }
            Result::<()>::Ok(())
        }
        .await;
        match result {
            Ok(()) => transaction.commit().await?,
            Err(error) => {
                let error =
                    error.context(format!("While replacing the custom fields of trade {}", trade_id));
                log::error!("{:#}", error);
                if let Err(rollback) = transaction.rollback().await {
                    log::error!("{:#}", rollback);
                }
                return Err(error);
            }
        }
        Self::for_trade(connection, trade_id).await
    }

    /// Removes all the values of the trade, returns how many were removed.
    pub async fn delete_for_trade<Exec: Executor>(executor: &mut Exec, trade_id: i64) -> Result<u64> {
        Self::delete_many(executor, &Self::trade_condition(trade_id))
            .await
            .map(|v| v.rows_affected)
    }
}

fn expect_one_row(result: &RowsAffected, action: &str) -> Result<()> {
    if result.rows_affected == 1 {
        return Ok(());
    }
    let error = Error::msg(format!(
        "The query {} {} rows instead of the expected 1",
        action, result.rows_affected
    ));
    log::info!("{}", error);
    Err(error)
}

impl Entity for TradeCustomField {
    fn table_def() -> &'static TableDef {
        &TRADE_CUSTOM_FIELDS
    }

    fn from_row(mut row: RowLabeled) -> Result<Self> {
        Ok(Self {
            id: row.take_as(Self::ID)?,
            trade_id: row.take_as(Self::TRADE_ID)?,
            field_definition_id: row.take_as(Self::FIELD_DEFINITION_ID)?,
            value: row.take_as(Self::VALUE)?,
            created_at: row.take_as(Self::CREATED_AT)?,
            updated_at: row.take_as(Self::UPDATED_AT)?,
        })
    }

    fn row_filtered(&self) -> Box<[(&'static str, Value)]> {
        let mut row = Vec::with_capacity(6);
        if let Passive::Set(id) = self.id {
            row.push((Self::ID, id.as_value()));
        }
        row.push((Self::TRADE_ID, self.trade_id.as_value()));
        row.push((Self::FIELD_DEFINITION_ID, self.field_definition_id.as_value()));
        row.push((Self::VALUE, self.value.clone().as_value()));
        if let Passive::Set(created_at) = self.created_at {
            row.push((Self::CREATED_AT, created_at.as_value()));
        }
        row.push((Self::UPDATED_AT, self.updated_at.as_value()));
        row.into_boxed_slice()
    }

    fn primary_key(&self) -> Row {
        [self.id.as_value()].into()
    }
}
