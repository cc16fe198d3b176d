//! Identity table.
//!
//! Rows are provisioned out of band (the `admin_cli` binary); the HTTP
//! surface never creates identities. The `api_token` column is the bearer
//! credential the auth middleware resolves on every protected request.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub email: String,
    pub api_token: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wallets::Entity")]
    Wallets,
    #[sea_orm(has_one = "super::profiles::Entity")]
    Profile,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A resolved, non-blocked identity attached to a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub email: String,
}

impl From<Model> for Caller {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            email: value.email,
        }
    }
}
