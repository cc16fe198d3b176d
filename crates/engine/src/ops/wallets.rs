//! Wallet operations.

use chrono::Utc;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{MemberRole, ResultEngine, expenses, wallet_members, wallets};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Lists wallets the user owns or has joined, deduplicated and ordered
    /// by creation time.
    pub async fn list_wallets(&self, user_id: &str) -> ResultEngine<Vec<wallets::Model>> {
        let membership_ids: Vec<String> = wallet_members::Entity::find()
            .filter(wallet_members::Column::UserId.eq(user_id.to_string()))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|m| m.wallet_id)
            .collect();

        wallets::Entity::find()
            .filter(
                Condition::any()
                    .add(wallets::Column::OwnerId.eq(user_id.to_string()))
                    .add(wallets::Column::Id.is_in(membership_ids)),
            )
            .order_by_asc(wallets::Column::CreatedAt)
            .all(&self.database)
            .await
            .map_err(Into::into)
    }

    /// Creates a wallet and its owner membership row in one transaction.
    pub async fn create_wallet(&self, name: &str, user_id: &str) -> ResultEngine<wallets::Model> {
        let name = normalize_required_name(name, "wallet")?;
        with_tx!(self, |db_tx| {
            let wallet = wallets::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                name: ActiveValue::Set(name),
                owner_id: ActiveValue::Set(user_id.to_string()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            wallet_members::ActiveModel {
                wallet_id: ActiveValue::Set(wallet.id.clone()),
                user_id: ActiveValue::Set(user_id.to_string()),
                role: ActiveValue::Set(MemberRole::Owner.as_str().to_string()),
            }
            .insert(&db_tx)
            .await?;

            Ok(wallet)
        })
    }

    /// Deletes a wallet and everything scoped to it (owner-only).
    ///
    /// The cascade runs expenses → members → wallet inside one transaction,
    /// so a second delete finds nothing and fails with `KeyNotFound` rather
    /// than observing a partial cascade.
    pub async fn delete_wallet(&self, wallet_id: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_wallet_owner(&db_tx, wallet_id, user_id).await?;

            expenses::Entity::delete_many()
                .filter(expenses::Column::WalletId.eq(wallet_id.to_string()))
                .exec(&db_tx)
                .await?;
            wallet_members::Entity::delete_many()
                .filter(wallet_members::Column::WalletId.eq(wallet_id.to_string()))
                .exec(&db_tx)
                .await?;
            wallets::Entity::delete_by_id(wallet_id.to_string())
                .exec(&db_tx)
                .await?;

            Ok(())
        })
    }
}
