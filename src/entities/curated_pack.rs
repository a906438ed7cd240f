//! Curated pack entity - A user-assembled, shareable track selection.
//!
//! Curated packs reference pre-existing tracks owned by other creators and
//! are reached through an opaque `share_code`. A pack flagged `is_free`
//! bypasses the ledger entirely on download; paid packs charge one token per
//! track the downloader does not already own.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Curated pack database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "curated_packs")]
pub struct Model {
    /// Unique identifier for the curated pack
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who assembled the pack
    pub owner_id: i64,
    /// Display name of the pack
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Opaque 8-character code used in share links
    #[sea_orm(unique)]
    pub share_code: String,
    /// If true, downloads bypass the ledger and the ownership registry
    pub is_free: bool,
    /// How many times the public share page has been viewed
    pub view_count: i64,
    /// How many download requests the pack has served
    pub download_count: i64,
    /// Soft delete flag - inactive packs behave as missing everywhere
    pub is_active: bool,
    /// When the pack was created
    pub created_at: DateTimeUtc,
    /// When the pack was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between curated packs and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One curated pack has many track memberships
    #[sea_orm(has_many = "super::curated_pack_track::Entity")]
    Tracks,
}

impl Related<super::curated_pack_track::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tracks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
