//! Library entry entity - A user's durable ownership of one track.
//!
//! Created exactly once per (user, track) pair; later downloads of an owned
//! track only bump `download_count` and `downloaded_at`, with no new charge.
//! The composite unique index on (`user_id`, `track_id`) is created in
//! [`crate::config::database::create_tables`] and doubles as the tie-breaker
//! for racing purchases.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Library entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "library_entries")]
pub struct Model {
    /// Unique identifier for the library entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Owned track
    pub track_id: i64,
    /// Tokens charged when ownership was first acquired
    pub tokens_spent: i64,
    /// When the track was first purchased
    pub purchased_at: DateTimeUtc,
    /// When the track was last downloaded, None if never re-fetched
    pub downloaded_at: Option<DateTimeUtc>,
    /// Number of downloads performed against this entry
    pub download_count: i64,
}

/// Defines relationships between library entries and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each library entry points at one track
    #[sea_orm(
        belongs_to = "super::track::Entity",
        from = "Column::TrackId",
        to = "super::track::Column::Id"
    )]
    Track,
}

impl Related<super::track::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Track.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
