//! Request authorization: token resolution and wallet access checks.

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};

use crate::{Caller, EngineError, ResultEngine, profiles, users, wallet_members, wallets};

use super::Engine;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
        }
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "owner" => Ok(Self::Owner),
            "member" => Ok(Self::Member),
            other => Err(EngineError::InvalidField(format!(
                "invalid membership role: {other}"
            ))),
        }
    }
}

impl Engine {
    /// Resolves a bearer token to a non-blocked identity.
    ///
    /// This runs on every protected route, before any other logic: an
    /// unknown token is `Unauthorized`, a blocked account is `Forbidden`
    /// even if the token itself is still valid at the identity layer.
    pub async fn resolve_caller(&self, token: &str) -> ResultEngine<Caller> {
        if token.is_empty() {
            return Err(EngineError::Unauthorized("no token".to_string()));
        }

        let user = users::Entity::find()
            .filter(users::Column::ApiToken.eq(token))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::Unauthorized("invalid token".to_string()))?;

        // Caller-scoped profile lookup; a missing profile row counts as not
        // blocked, matching the identity collaborator's behavior.
        let blocked = profiles::Entity::find_by_id(user.id.clone())
            .one(&self.database)
            .await?
            .is_some_and(|p| p.is_blocked);
        if blocked {
            return Err(EngineError::Forbidden("account blocked".to_string()));
        }

        Ok(Caller::from(user))
    }

    pub(super) async fn wallet_member_role<C: ConnectionTrait>(
        &self,
        db: &C,
        wallet_id: &str,
        user_id: &str,
    ) -> ResultEngine<Option<MemberRole>> {
        let row =
            wallet_members::Entity::find_by_id((wallet_id.to_string(), user_id.to_string()))
                .one(db)
                .await?;
        row.as_ref()
            .map(|m| MemberRole::try_from(m.role.as_str()))
            .transpose()
    }

    /// Requires the user to be the wallet's owner or one of its members.
    ///
    /// A wallet that does not exist is reported as `Forbidden`, identical to
    /// an inaccessible one, so existence never leaks.
    pub(super) async fn require_wallet_access<C: ConnectionTrait>(
        &self,
        db: &C,
        wallet_id: &str,
        user_id: &str,
    ) -> ResultEngine<wallets::Model> {
        let denied = || EngineError::Forbidden("no access to this wallet".to_string());

        let model = wallets::Entity::find_by_id(wallet_id.to_string())
            .one(db)
            .await?
            .ok_or_else(denied)?;
        if model.owner_id == user_id {
            return Ok(model);
        }
        if self
            .wallet_member_role(db, wallet_id, user_id)
            .await?
            .is_some()
        {
            return Ok(model);
        }
        Err(denied())
    }

    /// Requires the user to be the wallet's owner.
    ///
    /// Owner-gated operations (deletion, invitations) distinguish an absent
    /// wallet (`KeyNotFound`) from a foreign one (`Forbidden`).
    pub(super) async fn require_wallet_owner<C: ConnectionTrait>(
        &self,
        db: &C,
        wallet_id: &str,
        user_id: &str,
    ) -> ResultEngine<wallets::Model> {
        let model = wallets::Entity::find_by_id(wallet_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
        if model.owner_id != user_id {
            return Err(EngineError::Forbidden(
                "only the owner can do this".to_string(),
            ));
        }
        Ok(model)
    }

    /// Requires the caller to be an admin.
    ///
    /// The check goes through the privileged store on purpose: the
    /// caller-scoped path may itself be subject to row-level restrictions
    /// that would hide other profiles from an admin.
    pub(super) async fn require_admin(&self, user_id: &str) -> ResultEngine<()> {
        if !self.admin.is_admin(user_id).await? {
            return Err(EngineError::Forbidden("not admin".to_string()));
        }
        Ok(())
    }
}
