//! Request and response bodies shared between the server and its clients.
//!
//! Successful writes answer with an `{ "success": true, "data": ... }`
//! envelope; failures answer `{ "error": "..." }` (built server-side).
//! Record ids are UUIDs serialized as plain strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Bare success envelope for writes that return no payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        SuccessResponse { success: true }
    }
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: String,
        pub name: String,
        pub owner_id: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletCreated {
        pub success: bool,
        pub data: WalletView,
    }
}

pub mod member {
    use super::*;

    /// Role of a user inside a wallet.
    ///
    /// `owner` is assigned once at wallet creation; invitations can only
    /// grant `member`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        Owner,
        Member,
    }

    impl Role {
        /// Returns the canonical role string used by the engine/database.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Owner => "owner",
                Self::Member => "member",
            }
        }
    }

    /// Request body for inviting a user by email.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberInvite {
        pub email: String,
        pub role: Option<Role>,
    }

    /// A member with their role.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub user_id: String,
        pub email: String,
        pub role: String,
    }

    /// Response body for listing a wallet's members.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }
}

pub mod expense {
    use super::*;

    /// Request body for creating or updating an expense record.
    ///
    /// `icon` is the category emoji shown by clients; the server maps it to
    /// a canonical label (unknown emoji fall back to the default category).
    /// `category_type` is `expense` (default) or `income`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub wallet_id: String,
        pub item: String,
        pub price: f64,
        pub store: Option<String>,
        pub date: Option<NaiveDate>,
        pub icon: Option<String>,
        pub category_type: Option<String>,
    }

    /// An expense record as returned to clients, icon included.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: String,
        pub user_id: String,
        pub wallet_id: String,
        pub item: String,
        pub price: f64,
        pub store: String,
        pub date: NaiveDate,
        pub category: String,
        pub icon: String,
        pub category_type: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub success: bool,
        pub data: ExpenseView,
    }

    /// Query string for `GET /expenses`.
    ///
    /// `month`/`year` filter to one calendar month when both are present;
    /// `search` matches a substring of `item`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseListParams {
        pub wallet_id: Option<String>,
        pub month: Option<u32>,
        pub year: Option<i32>,
        pub search: Option<String>,
    }
}

pub mod import {
    use super::*;

    /// One rejected CSV row with its 1-based data line number.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RejectedRowView {
        pub line: usize,
        pub reason: String,
    }

    /// Outcome of a CSV upload.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ImportResult {
        pub success: bool,
        pub inserted: usize,
        pub rejected: Vec<RejectedRowView>,
    }
}

pub mod admin {
    use super::*;

    /// A user row in the admin panel listing.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdminUserView {
        pub id: String,
        pub email: String,
        pub full_name: String,
        pub is_blocked: bool,
        pub is_admin: bool,
        pub created_at: DateTime<Utc>,
    }

    /// Request body for a moderation action.
    ///
    /// `action` is one of `block`, `unblock`, `promote`, `demote`,
    /// `delete`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdminActionRequest {
        pub user_id: String,
        pub action: String,
    }
}
