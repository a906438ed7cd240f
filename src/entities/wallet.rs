//! Wallet entity - Per-user token balance plus lifetime counters.
//!
//! Exactly one wallet exists per user, created lazily on first reference.
//! The `balance` column is the source of truth for spendable tokens; the
//! ledger is an audit trail maintained in lockstep, never read back to
//! reconstruct balances. Invariant: `balance >= 0`, checked before every
//! mutation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Wallet database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    /// Unique identifier for the wallet
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user - one wallet per user
    #[sea_orm(unique)]
    pub user_id: i64,
    /// Current spendable balance in tokens, never negative
    pub balance: i64,
    /// Lifetime tokens spent, monotonically non-decreasing
    pub total_spent: i64,
    /// Lifetime tokens earned from sales, monotonically non-decreasing
    pub total_earned: i64,
    /// When the wallet was created
    pub created_at: DateTimeUtc,
    /// When the wallet was last mutated
    pub updated_at: DateTimeUtc,
}

/// Wallets are keyed by user id and have no entity-level relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
