//! Membership management (owner-only).

use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, users, wallet_members};

use super::{Engine, access::MemberRole, with_tx};

/// A wallet member joined with their identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberRecord {
    pub user_id: String,
    pub email: String,
    pub role: String,
}

impl Engine {
    /// Adds a user to a wallet by email (owner-only).
    ///
    /// The target is resolved through the privileged identity listing, the
    /// same way the hosted backend looked invitees up. Unknown email →
    /// `KeyNotFound` (404). Re-inviting an existing member is idempotent.
    pub async fn add_member(
        &self,
        wallet_id: &str,
        email: &str,
        role: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<()> {
        let role = match role {
            Some(raw) => MemberRole::try_from(raw)?,
            None => MemberRole::Member,
        };
        // The single owner row is written at wallet creation and never via
        // invitation, or the one-owner-per-wallet invariant would break.
        if role == MemberRole::Owner {
            return Err(EngineError::InvalidField(
                "invited members cannot be owners".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            // Ownership is checked before the privileged lookup runs, so a
            // non-owner can never learn whether an email is registered.
            let wallet = self.require_wallet_owner(&db_tx, wallet_id, user_id).await?;

            let target = self
                .admin_store()
                .find_identity_by_email(email)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("user not found".to_string()))?;
            if target.id == wallet.owner_id {
                // Already the owner; nothing to upsert.
                return Ok(());
            }

            let active = wallet_members::ActiveModel {
                wallet_id: ActiveValue::Set(wallet.id.clone()),
                user_id: ActiveValue::Set(target.id.clone()),
                role: ActiveValue::Set(role.as_str().to_string()),
            };

            // Upsert: insert if missing, otherwise leave the row in place.
            match wallet_members::Entity::find_by_id((wallet.id, target.id))
                .one(&db_tx)
                .await?
            {
                Some(_) => {
                    active.update(&db_tx).await?;
                }
                None => {
                    active.insert(&db_tx).await?;
                }
            }

            Ok(())
        })
    }

    /// Lists wallet members with their emails (owner-only).
    pub async fn list_members(
        &self,
        wallet_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<MemberRecord>> {
        with_tx!(self, |db_tx| {
            self.require_wallet_owner(&db_tx, wallet_id, user_id).await?;

            let rows: Vec<(wallet_members::Model, Option<users::Model>)> =
                wallet_members::Entity::find()
                    .filter(wallet_members::Column::WalletId.eq(wallet_id.to_string()))
                    .find_also_related(users::Entity)
                    .all(&db_tx)
                    .await?;

            Ok(rows
                .into_iter()
                .map(|(member, user)| MemberRecord {
                    user_id: member.user_id,
                    email: user.map(|u| u.email).unwrap_or_default(),
                    role: member.role,
                })
                .collect())
        })
    }
}
