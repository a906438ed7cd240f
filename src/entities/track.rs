//! Track entity - An individually downloadable audio item.
//!
//! Tracks can be standalone or belong to a pack via `pack_id`. The stored
//! `token_cost` column is legacy/display-only: settlement always charges the
//! fixed unit cost of one token per track, and tracks inside a pack are
//! individually free (the pack carries the aggregate cost). `is_active` is a
//! one-way soft-delete flag with no resurrection path.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Track database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tracks")]
pub struct Model {
    /// Unique identifier for the track
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display title of the track
    pub title: String,
    /// User who uploaded the track and receives sale proceeds
    pub creator_id: i64,
    /// Pack this track belongs to, None for standalone tracks
    pub pack_id: Option<i64>,
    /// Opaque pointer into the external blob store
    pub audio_url: String,
    /// Legacy stored price - never consulted by settlement
    pub token_cost: i64,
    /// How many times the track has been played (free action)
    pub play_count: i64,
    /// How many times the track has been downloaded
    pub download_count: i64,
    /// Order within the owning pack, None for standalone tracks
    pub track_number: Option<i32>,
    /// Soft delete flag - inactive tracks behave as missing everywhere
    pub is_active: bool,
    /// When the track was created
    pub created_at: DateTimeUtc,
    /// When the track was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Track and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each track optionally belongs to one pack
    #[sea_orm(
        belongs_to = "super::pack::Entity",
        from = "Column::PackId",
        to = "super::pack::Column::Id"
    )]
    Pack,
    /// One track appears in many libraries
    #[sea_orm(has_many = "super::library_entry::Entity")]
    LibraryEntries,
}

impl Related<super::pack::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pack.def()
    }
}

impl Related<super::library_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LibraryEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
