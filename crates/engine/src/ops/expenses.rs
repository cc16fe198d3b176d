//! Expense record operations.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, ExpenseKind, ResultEngine, categories, expenses,
};

use super::{Engine, normalize_optional_text, with_tx};

/// Client-supplied fields for creating or updating an expense.
///
/// `icon` is the client-facing emoji, translated to a canonical category
/// label before storage; `category_type` selects expense vs income.
#[derive(Clone, Debug, Default)]
pub struct ExpenseDraft {
    pub item: String,
    pub price: f64,
    pub store: Option<String>,
    pub date: Option<NaiveDate>,
    pub icon: Option<String>,
    pub category_type: Option<String>,
}

impl ExpenseDraft {
    fn item_trimmed(&self) -> ResultEngine<String> {
        let item = self.item.trim();
        if item.is_empty() {
            return Err(EngineError::InvalidField(
                "missing required field: item".to_string(),
            ));
        }
        Ok(item.to_string())
    }

    fn price_checked(&self) -> ResultEngine<f64> {
        if self.price <= 0.0 {
            return Err(EngineError::InvalidField(
                "price must be positive".to_string(),
            ));
        }
        Ok(self.price)
    }

    fn category(&self) -> String {
        // Total mapping: unknown/missing icons degrade to the default label.
        categories::icon_to_category(self.icon.as_deref().unwrap_or_default()).to_string()
    }

    fn kind(&self) -> ResultEngine<ExpenseKind> {
        match self.category_type.as_deref() {
            Some(raw) => ExpenseKind::try_from(raw),
            None => Ok(ExpenseKind::default()),
        }
    }

    fn store(&self) -> String {
        normalize_optional_text(self.store.as_deref())
            .unwrap_or_else(|| crate::import::UNKNOWN_STORE.to_string())
    }
}

/// Filters for listing a wallet's expenses.
///
/// `month` and `year` only take effect together and select
/// `[first-of-month, first-of-next-month)`; `search` is a case-insensitive
/// substring match on `item`.
#[derive(Clone, Debug, Default)]
pub struct ExpenseListFilter {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub search: Option<String>,
}

fn month_range(year: i32, month: u32) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let from = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::InvalidField(format!("invalid month: {year}-{month}")))?;
    // December rolls into January of the next year.
    let to = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| EngineError::InvalidField(format!("invalid month: {year}-{month}")))?;
    Ok((from, to))
}

impl Engine {
    /// Creates an expense in a wallet the user can access.
    pub async fn create_expense(
        &self,
        wallet_id: &str,
        draft: ExpenseDraft,
        user_id: &str,
    ) -> ResultEngine<expenses::Model> {
        let item = draft.item_trimmed()?;
        let price = draft.price_checked()?;
        let kind = draft.kind()?;

        with_tx!(self, |db_tx| {
            self.require_wallet_access(&db_tx, wallet_id, user_id)
                .await?;

            let model = expenses::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                wallet_id: ActiveValue::Set(wallet_id.to_string()),
                item: ActiveValue::Set(item),
                price: ActiveValue::Set(price),
                store: ActiveValue::Set(draft.store()),
                date: ActiveValue::Set(draft.date.unwrap_or_else(|| Utc::now().date_naive())),
                category: ActiveValue::Set(draft.category()),
                kind: ActiveValue::Set(kind.as_str().to_string()),
            }
            .insert(&db_tx)
            .await?;

            Ok(model)
        })
    }

    /// Lists a wallet's expenses, newest first.
    pub async fn list_expenses(
        &self,
        wallet_id: &str,
        filter: &ExpenseListFilter,
        user_id: &str,
    ) -> ResultEngine<Vec<expenses::Model>> {
        let range = match (filter.year, filter.month) {
            (Some(year), Some(month)) => Some(month_range(year, month)?),
            _ => None,
        };

        with_tx!(self, |db_tx| {
            self.require_wallet_access(&db_tx, wallet_id, user_id)
                .await?;

            let mut query = expenses::Entity::find()
                .filter(expenses::Column::WalletId.eq(wallet_id.to_string()));

            if let Some((from, to)) = range {
                query = query
                    .filter(expenses::Column::Date.gte(from))
                    .filter(expenses::Column::Date.lt(to));
            }
            if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
                query = query.filter(expenses::Column::Item.contains(search.trim()));
            }

            query
                .order_by_desc(expenses::Column::Date)
                .all(&db_tx)
                .await
                .map_err(Into::into)
        })
    }

    /// Updates an expense (creator-only).
    ///
    /// A record that does not exist reads the same as someone else's:
    /// `Forbidden`, never `KeyNotFound`.
    pub async fn update_expense(
        &self,
        expense_id: &str,
        draft: ExpenseDraft,
        user_id: &str,
    ) -> ResultEngine<expenses::Model> {
        let item = draft.item_trimmed()?;
        let price = draft.price_checked()?;
        let kind = draft.kind()?;

        with_tx!(self, |db_tx| {
            let existing = self.require_expense_creator(&db_tx, expense_id, user_id).await?;

            let model = expenses::ActiveModel {
                id: ActiveValue::Set(existing.id.clone()),
                item: ActiveValue::Set(item),
                price: ActiveValue::Set(price),
                store: ActiveValue::Set(draft.store()),
                date: ActiveValue::Set(draft.date.unwrap_or(existing.date)),
                category: ActiveValue::Set(draft.category()),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            Ok(model)
        })
    }

    /// Deletes an expense (creator-only).
    pub async fn delete_expense(&self, expense_id: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_expense_creator(&db_tx, expense_id, user_id).await?;
            expenses::Entity::delete_by_id(expense_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    async fn require_expense_creator<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        expense_id: &str,
        user_id: &str,
    ) -> ResultEngine<expenses::Model> {
        let denied = || EngineError::Forbidden("not the record creator".to_string());
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .one(db)
            .await?
            .ok_or_else(denied)?;
        if model.user_id != user_id {
            return Err(denied());
        }
        Ok(model)
    }
}
