//! Ledger entry entity - Append-only record of every monetary event.
//!
//! Each entry carries the owning `user_id`, a kind (`bonus`, `purchase`,
//! `spend`, `earn`), the signed token `amount`, and a `balance_after`
//! snapshot taken in the same transaction as the wallet mutation. Entries are
//! created once per discrete monetary event and never updated or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User whose wallet this entry belongs to
    pub user_id: i64,
    /// Event kind: `"bonus"`, `"purchase"`, `"spend"`, or `"earn"`
    pub kind: String,
    /// Signed token amount - positive for credits, negative for debits
    pub amount: i64,
    /// Wallet balance immediately after this event was applied
    pub balance_after: i64,
    /// What the entry references: `"track_download"`, `"track_sale"`,
    /// `"curated_pack_download"`, `"token_purchase"`, `"signup_bonus"`
    pub reference_type: Option<String>,
    /// ID of the referenced track or package, when applicable
    pub reference_id: Option<i64>,
    /// Human-readable description of the event
    pub description: String,
    /// When the event occurred
    pub created_at: DateTimeUtc,
}

/// Ledger entries reference tracks and packages by plain id columns
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
