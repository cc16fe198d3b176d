//! User moderation (admin-only).
//!
//! Every operation here starts with `require_admin`, which reads the acting
//! caller's profile through the privileged store rather than the
//! caller-scoped connection.

use std::collections::HashMap;

use sea_orm::{QueryFilter, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, expenses, wallet_members, wallets};

use super::{Engine, with_tx};

/// Moderation actions accepted by the admin endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminAction {
    Block,
    Unblock,
    Promote,
    Demote,
    Delete,
}

impl TryFrom<&str> for AdminAction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "block" => Ok(Self::Block),
            "unblock" => Ok(Self::Unblock),
            "promote" => Ok(Self::Promote),
            "demote" => Ok(Self::Demote),
            "delete" => Ok(Self::Delete),
            other => Err(EngineError::InvalidField(format!(
                "unknown action: {other}"
            ))),
        }
    }
}

impl AdminAction {
    /// Actions an admin must not apply to their own account, so the panel
    /// cannot end up without any admin able to undo a mistake.
    fn forbidden_on_self(self) -> bool {
        matches!(self, Self::Block | Self::Demote | Self::Delete)
    }
}

/// One row of the admin user listing: profile joined with identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminUserRecord {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub is_blocked: bool,
    pub is_admin: bool,
    pub created_at: DateTimeUtc,
}

impl Engine {
    /// Lists every user with their moderation flags (admin-only).
    pub async fn list_users(&self, acting_user: &str) -> ResultEngine<Vec<AdminUserRecord>> {
        self.require_admin(acting_user).await?;

        let identities: HashMap<String, String> = self
            .admin_store()
            .list_identities()
            .await?
            .into_iter()
            .map(|u| (u.id, u.email))
            .collect();

        let records = self
            .admin_store()
            .list_profiles()
            .await?
            .into_iter()
            .map(|p| AdminUserRecord {
                email: identities.get(&p.id).cloned().unwrap_or_else(|| "—".to_string()),
                full_name: p.full_name.unwrap_or_else(|| "—".to_string()),
                id: p.id,
                is_blocked: p.is_blocked,
                is_admin: p.is_admin,
                created_at: p.created_at,
            })
            .collect();

        Ok(records)
    }

    /// Applies a moderation action to a user (admin-only).
    pub async fn admin_action(
        &self,
        acting_user: &str,
        target_user: &str,
        action: AdminAction,
    ) -> ResultEngine<()> {
        self.require_admin(acting_user).await?;

        if acting_user == target_user && action.forbidden_on_self() {
            return Err(EngineError::InvalidField(
                "cannot apply this action to your own account".to_string(),
            ));
        }

        tracing::info!(acting_user, target_user, ?action, "moderation action");
        match action {
            AdminAction::Block => self.admin_store().set_blocked(target_user, true).await,
            AdminAction::Unblock => self.admin_store().set_blocked(target_user, false).await,
            AdminAction::Promote => self.admin_store().set_admin(target_user, true).await,
            AdminAction::Demote => self.admin_store().set_admin(target_user, false).await,
            AdminAction::Delete => self.delete_user_cascade(target_user).await,
        }
    }

    /// Removes a user and every record they own.
    ///
    /// Domain rows go first (owned wallets with their contents, then the
    /// user's own expenses and memberships in foreign wallets), then the
    /// identity itself through the privileged store.
    async fn delete_user_cascade(&self, target_user: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let owned: Vec<wallets::Model> = wallets::Entity::find()
                .filter(wallets::Column::OwnerId.eq(target_user.to_string()))
                .all(&db_tx)
                .await?;
            for wallet in owned {
                expenses::Entity::delete_many()
                    .filter(expenses::Column::WalletId.eq(wallet.id.clone()))
                    .exec(&db_tx)
                    .await?;
                wallet_members::Entity::delete_many()
                    .filter(wallet_members::Column::WalletId.eq(wallet.id.clone()))
                    .exec(&db_tx)
                    .await?;
                wallets::Entity::delete_by_id(wallet.id)
                    .exec(&db_tx)
                    .await?;
            }

            expenses::Entity::delete_many()
                .filter(expenses::Column::UserId.eq(target_user.to_string()))
                .exec(&db_tx)
                .await?;
            wallet_members::Entity::delete_many()
                .filter(wallet_members::Column::UserId.eq(target_user.to_string()))
                .exec(&db_tx)
                .await?;

            Ok::<(), EngineError>(())
        })?;

        self.admin_store().delete_identity(target_user).await
    }
}
