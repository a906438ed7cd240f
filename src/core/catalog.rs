//! Catalog operations - tracks, packs, derived pricing, and play counters.
//!
//! Pack pricing is derived, never stored: the effective price of a pack is
//! the count of its currently-active tracks (one token per track), recomputed
//! on every read. The `token_cost` columns that exist on tracks and packs are
//! legacy display fields and are never consulted here or by settlement.
//! Soft deletion is one-way: an inactive track or pack behaves as missing on
//! every read path, and its absence shows up in the next `pack_price` call
//! with no separate recompute step.

use crate::{
    entities::{Pack, Track, pack, track},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*, sea_query::Expr};

/// Creates a new track, optionally attached to a pack.
///
/// The `token_cost` argument is stored for display only; settlement always
/// charges the fixed unit cost. When `pack_id` is given the pack must exist
/// and be active.
pub async fn create_track(
    db: &DatabaseConnection,
    title: String,
    creator_id: i64,
    pack_id: Option<i64>,
    audio_url: String,
    token_cost: i64,
    track_number: Option<i32>,
) -> Result<track::Model> {
    if title.trim().is_empty() {
        return Err(Error::Invalid {
            message: "track title cannot be empty".to_string(),
        });
    }
    if token_cost < 0 {
        return Err(Error::Invalid {
            message: format!("token_cost cannot be negative, got {token_cost}"),
        });
    }
    if let Some(pack_id) = pack_id {
        get_active_pack(db, pack_id).await?;
    }

    let now = chrono::Utc::now();
    let track = track::ActiveModel {
        title: Set(title.trim().to_string()),
        creator_id: Set(creator_id),
        pack_id: Set(pack_id),
        audio_url: Set(audio_url),
        token_cost: Set(token_cost),
        play_count: Set(0),
        download_count: Set(0),
        track_number: Set(track_number),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    track.insert(db).await.map_err(Into::into)
}

/// Creates a new pack. The stored `token_cost` is display-only - the
/// effective price always comes from [`pack_price`].
pub async fn create_pack(
    db: &DatabaseConnection,
    name: String,
    creator_id: i64,
    token_cost: i64,
) -> Result<pack::Model> {
    if name.trim().is_empty() {
        return Err(Error::Invalid {
            message: "pack name cannot be empty".to_string(),
        });
    }

    let now = chrono::Utc::now();
    let pack = pack::ActiveModel {
        name: Set(name.trim().to_string()),
        creator_id: Set(creator_id),
        token_cost: Set(token_cost),
        download_count: Set(0),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    pack.insert(db).await.map_err(Into::into)
}

/// Finds a track by id, treating inactive tracks as missing.
pub async fn get_active_track<C>(conn: &C, track_id: i64) -> Result<track::Model>
where
    C: ConnectionTrait,
{
    Track::find_by_id(track_id)
        .one(conn)
        .await?
        .filter(|t| t.is_active)
        .ok_or_else(|| Error::not_found("track", track_id))
}

/// Finds a pack by id, treating inactive packs as missing.
pub async fn get_active_pack<C>(conn: &C, pack_id: i64) -> Result<pack::Model>
where
    C: ConnectionTrait,
{
    Pack::find_by_id(pack_id)
        .one(conn)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| Error::not_found("pack", pack_id))
}

/// The pack's effective price: one token per currently-active child track.
///
/// Always recomputed from the live track rows, so a soft-deleted track is
/// reflected on the very next call.
pub async fn pack_price<C>(conn: &C, pack_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    get_active_pack(conn, pack_id).await?;

    let count = Track::find()
        .filter(track::Column::PackId.eq(pack_id))
        .filter(track::Column::IsActive.eq(true))
        .count(conn)
        .await?;
    Ok(i64::try_from(count).unwrap_or(i64::MAX))
}

/// The pack's active tracks, ordered by `track_number` ascending with
/// insertion order breaking ties.
pub async fn pack_track_list<C>(conn: &C, pack_id: i64) -> Result<Vec<track::Model>>
where
    C: ConnectionTrait,
{
    get_active_pack(conn, pack_id).await?;

    Track::find()
        .filter(track::Column::PackId.eq(pack_id))
        .filter(track::Column::IsActive.eq(true))
        .order_by_asc(track::Column::TrackNumber)
        .order_by_asc(track::Column::Id)
        .all(conn)
        .await
        .map_err(Into::into)
}

/// Records a play. Free action - no tokens, no ownership involved.
///
/// Returns the new play count.
pub async fn record_play(db: &DatabaseConnection, track_id: i64) -> Result<i64> {
    get_active_track(db, track_id).await?;

    Track::update_many()
        .col_expr(
            track::Column::PlayCount,
            Expr::col(track::Column::PlayCount).add(1),
        )
        .filter(track::Column::Id.eq(track_id))
        .exec(db)
        .await?;

    let track = Track::find_by_id(track_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("track", track_id))?;
    Ok(track.play_count)
}

/// Bumps the track's aggregate download counter. Settlement-internal.
pub(crate) async fn increment_track_downloads<C>(conn: &C, track_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Track::update_many()
        .col_expr(
            track::Column::DownloadCount,
            Expr::col(track::Column::DownloadCount).add(1),
        )
        .filter(track::Column::Id.eq(track_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Soft deletes a track. One-way: there is no resurrection path, and every
/// read (pricing, listings, settlement) immediately treats it as missing.
pub async fn deactivate_track(db: &DatabaseConnection, track_id: i64) -> Result<track::Model> {
    let mut track: track::ActiveModel = get_active_track(db, track_id).await?.into();
    track.is_active = Set(false);
    track.updated_at = Set(chrono::Utc::now());
    track.update(db).await.map_err(Into::into)
}

/// Soft deletes a pack. Existing ownership records and ledger entries for its
/// tracks are untouched.
pub async fn deactivate_pack(db: &DatabaseConnection, pack_id: i64) -> Result<pack::Model> {
    let mut pack: pack::ActiveModel = get_active_pack(db, pack_id).await?.into();
    pack.is_active = Set(false);
    pack.updated_at = Set(chrono::Utc::now());
    pack.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{create_test_track, setup_test_db};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_track_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_track(&db, "  ".to_string(), 1, None, "u".to_string(), 5, None).await;
        assert!(matches!(result.unwrap_err(), Error::Invalid { .. }));

        let result =
            create_track(&db, "Song".to_string(), 1, None, "u".to_string(), -1, None).await;
        assert!(matches!(result.unwrap_err(), Error::Invalid { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_pack_price_is_derived_from_active_tracks() -> Result<()> {
        let db = setup_test_db().await?;

        // Stored token_cost of 10 must be ignored everywhere
        let pack = create_pack(&db, "Summer Pack".to_string(), 1, 10).await?;
        assert_eq!(pack_price(&db, pack.id).await?, 0);

        let mut track_ids = Vec::new();
        for n in 1..=3 {
            let track = create_track(
                &db,
                format!("Track {n}"),
                1,
                Some(pack.id),
                format!("audio/{n}.mp3"),
                5,
                Some(n),
            )
            .await?;
            track_ids.push(track.id);
        }
        assert_eq!(pack_price(&db, pack.id).await?, 3);

        // Soft-deleting one track drops the price by one on the next read
        deactivate_track(&db, track_ids[1]).await?;
        assert_eq!(pack_price(&db, pack.id).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_pack_track_list_ordering() -> Result<()> {
        let db = setup_test_db().await?;
        let pack = create_pack(&db, "Ordered".to_string(), 1, 0).await?;

        // Inserted out of order; listing sorts by track_number, id breaks ties
        let third = create_track(&db, "C".to_string(), 1, Some(pack.id), "c".to_string(), 5, Some(3)).await?;
        let first = create_track(&db, "A".to_string(), 1, Some(pack.id), "a".to_string(), 5, Some(1)).await?;
        let tied_a = create_track(&db, "B1".to_string(), 1, Some(pack.id), "b1".to_string(), 5, Some(2)).await?;
        let tied_b = create_track(&db, "B2".to_string(), 1, Some(pack.id), "b2".to_string(), 5, Some(2)).await?;

        let listed = pack_track_list(&db, pack.id).await?;
        let ids: Vec<i64> = listed.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first.id, tied_a.id, tied_b.id, third.id]);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_play_counts_up() -> Result<()> {
        let db = setup_test_db().await?;
        let track = create_test_track(&db, "Played", 1).await?;

        assert_eq!(record_play(&db, track.id).await?, 1);
        assert_eq!(record_play(&db, track.id).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_entities_behave_as_missing() -> Result<()> {
        let db = setup_test_db().await?;
        let track = create_test_track(&db, "Gone", 1).await?;

        deactivate_track(&db, track.id).await?;

        assert!(matches!(
            get_active_track(&db, track.id).await.unwrap_err(),
            Error::NotFound { .. }
        ));
        assert!(matches!(
            record_play(&db, track.id).await.unwrap_err(),
            Error::NotFound { .. }
        ));
        // Soft delete is one-way; a second delete sees a missing track
        assert!(matches!(
            deactivate_track(&db, track.id).await.unwrap_err(),
            Error::NotFound { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_track_rejects_inactive_pack() -> Result<()> {
        let db = setup_test_db().await?;
        let pack = create_pack(&db, "Short lived".to_string(), 1, 0).await?;
        deactivate_pack(&db, pack.id).await?;

        let result = create_track(
            &db,
            "Orphan".to_string(),
            1,
            Some(pack.id),
            "o".to_string(),
            5,
            Some(1),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }
}
