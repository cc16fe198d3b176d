use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine, admin_store::AdminStore};

mod access;
mod admin;
mod expenses;
mod import;
mod members;
mod wallets;

pub use access::MemberRole;
pub use admin::{AdminAction, AdminUserRecord};
pub use expenses::{ExpenseDraft, ExpenseListFilter};
pub use members::MemberRecord;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Core engine: every operation is a stateless, per-request check followed
/// by reads/writes against the caller-scoped connection.
///
/// Privileged lookups (identity listing, moderation flags) never touch
/// `database`; they go through the injected [`AdminStore`] so the two
/// credential scopes stay separate types.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    admin: AdminStore,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The privileged store, for callers that provision identities directly.
    pub fn admin_store(&self) -> &AdminStore {
        &self.admin
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidField(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    admin_database: Option<DatabaseConnection>,
}

impl EngineBuilder {
    /// Pass the caller-scoped database connection.
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the elevated connection used for privileged lookups.
    ///
    /// When omitted, the caller-scoped connection is reused (single-node
    /// deployments where the separation is logical rather than physical).
    pub fn admin_database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.admin_database = Some(db);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine> {
        let admin_db = self.admin_database.unwrap_or_else(|| self.database.clone());
        Ok(Engine {
            database: self.database,
            admin: AdminStore::new(admin_db),
        })
    }
}
