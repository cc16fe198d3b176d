//! Privileged identity/profile access.
//!
//! `AdminStore` wraps the elevated connection and is the only type allowed
//! to list identities, bypass row-level restrictions on profiles, or delete
//! an identity. Keeping it a distinct type (instead of a flag on the normal
//! connection) makes the privilege boundary visible at call sites.

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseConnection, DbErr, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, profiles, users};

#[derive(Clone, Debug)]
pub struct AdminStore {
    database: DatabaseConnection,
}

impl AdminStore {
    pub(crate) fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    /// Privileged profile read: sees every profile, blocked or not.
    pub(crate) async fn is_admin(&self, user_id: &str) -> ResultEngine<bool> {
        let profile = profiles::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?;
        Ok(profile.is_some_and(|p| p.is_admin))
    }

    /// Privileged identity lookup by email (member invitations).
    pub(crate) async fn find_identity_by_email(
        &self,
        email: &str,
    ) -> ResultEngine<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await
            .map_err(Into::into)
    }

    pub(crate) async fn list_identities(&self) -> ResultEngine<Vec<users::Model>> {
        users::Entity::find()
            .all(&self.database)
            .await
            .map_err(Into::into)
    }

    pub(crate) async fn list_profiles(&self) -> ResultEngine<Vec<profiles::Model>> {
        profiles::Entity::find()
            .all(&self.database)
            .await
            .map_err(Into::into)
    }

    pub(crate) async fn set_blocked(&self, user_id: &str, blocked: bool) -> ResultEngine<()> {
        let active = profiles::ActiveModel {
            id: ActiveValue::Set(user_id.to_string()),
            is_blocked: ActiveValue::Set(blocked),
            ..Default::default()
        };
        active
            .update(&self.database)
            .await
            .map_err(missing_profile)?;
        Ok(())
    }

    pub(crate) async fn set_admin(&self, user_id: &str, admin: bool) -> ResultEngine<()> {
        let active = profiles::ActiveModel {
            id: ActiveValue::Set(user_id.to_string()),
            is_admin: ActiveValue::Set(admin),
            ..Default::default()
        };
        active
            .update(&self.database)
            .await
            .map_err(missing_profile)?;
        Ok(())
    }

    /// Removes the identity and its profile. Domain rows (wallets,
    /// expenses, memberships) are the engine's job, not the store's.
    pub(crate) async fn delete_identity(&self, user_id: &str) -> ResultEngine<()> {
        profiles::Entity::delete_by_id(user_id.to_string())
            .exec(&self.database)
            .await?;
        users::Entity::delete_by_id(user_id.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Provisions a new identity with a fresh API token.
    ///
    /// Used by the admin CLI; signup does not exist on the HTTP surface.
    pub async fn create_identity(
        &self,
        email: &str,
        full_name: Option<&str>,
        admin: bool,
    ) -> ResultEngine<(users::Model, String)> {
        let id = Uuid::new_v4().to_string();
        let token = Uuid::new_v4().simple().to_string();
        let now = Utc::now();

        let user = users::ActiveModel {
            id: ActiveValue::Set(id.clone()),
            email: ActiveValue::Set(email.to_string()),
            api_token: ActiveValue::Set(token.clone()),
            created_at: ActiveValue::Set(now),
        }
        .insert(&self.database)
        .await?;

        profiles::ActiveModel {
            id: ActiveValue::Set(id),
            full_name: ActiveValue::Set(full_name.map(ToString::to_string)),
            is_blocked: ActiveValue::Set(false),
            is_admin: ActiveValue::Set(admin),
            created_at: ActiveValue::Set(now),
        }
        .insert(&self.database)
        .await?;

        Ok((user, token))
    }
}

/// A flag update that matched no profile row means the caller named an
/// unknown user, not that storage failed.
fn missing_profile(err: DbErr) -> EngineError {
    match err {
        DbErr::RecordNotUpdated => EngineError::KeyNotFound("user not found".to_string()),
        other => EngineError::Database(other),
    }
}
