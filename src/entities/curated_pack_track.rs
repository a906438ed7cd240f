//! Curated pack track entity - One track's membership in a curated pack.
//!
//! Membership rows carry an explicit `track_order`; listings sort by it
//! ascending with insertion order breaking ties. The composite unique index
//! on (`curated_pack_id`, `track_id`) prevents duplicate members.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Curated pack track database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "curated_pack_tracks")]
pub struct Model {
    /// Unique identifier for the membership row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Curated pack the track belongs to
    pub curated_pack_id: i64,
    /// The referenced track
    pub track_id: i64,
    /// Position within the pack, ascending
    pub track_order: i32,
    /// When the track was added to the pack
    pub added_at: DateTimeUtc,
}

/// Defines relationships between memberships and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each membership belongs to one curated pack
    #[sea_orm(
        belongs_to = "super::curated_pack::Entity",
        from = "Column::CuratedPackId",
        to = "super::curated_pack::Column::Id"
    )]
    CuratedPack,
    /// Each membership points at one track
    #[sea_orm(
        belongs_to = "super::track::Entity",
        from = "Column::TrackId",
        to = "super::track::Column::Id"
    )]
    Track,
}

impl Related<super::curated_pack::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CuratedPack.def()
    }
}

impl Related<super::track::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Track.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
