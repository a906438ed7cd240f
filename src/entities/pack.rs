//! Pack entity - A creator-published bundle of tracks.
//!
//! A pack's effective price is derived at read time from its count of active
//! child tracks (one token per track). The stored `token_cost` column is a
//! legacy/display cache and is never trusted by pricing or settlement.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pack database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "packs")]
pub struct Model {
    /// Unique identifier for the pack
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the pack
    pub name: String,
    /// User who published the pack
    pub creator_id: i64,
    /// Legacy stored price - effective price is always recomputed
    pub token_cost: i64,
    /// How many times the pack has been downloaded
    pub download_count: i64,
    /// Soft delete flag - inactive packs behave as missing everywhere
    pub is_active: bool,
    /// When the pack was created
    pub created_at: DateTimeUtc,
    /// When the pack was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Pack and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One pack has many tracks
    #[sea_orm(has_many = "super::track::Entity")]
    Tracks,
}

impl Related<super::track::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tracks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
