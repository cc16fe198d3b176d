//! Core engine for the expense-tracking backend.
//!
//! All state lives in the database; the engine itself is a stateless bundle
//! of per-request operations plus the two capability-scoped connections
//! (caller and admin).

pub use admin_store::AdminStore;
pub use error::EngineError;
pub use expenses::ExpenseKind;
pub use import::{ExpenseRow, ImportOutcome, RawRow, RejectReason, RejectedRow};
pub use ops::{
    AdminAction, AdminUserRecord, Engine, EngineBuilder, ExpenseDraft, ExpenseListFilter,
    MemberRecord, MemberRole,
};
pub use users::Caller;

mod admin_store;
mod error;
mod ops;

pub mod categories;
pub mod import;

pub mod expenses;
pub mod profiles;
pub mod users;
pub mod wallet_members;
pub mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
