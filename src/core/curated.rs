//! Curated packs - user-assembled, shareable track selections.
//!
//! A curated pack references pre-existing tracks from other creators and is
//! reached only through its opaque share code. Free packs bypass the ledger
//! entirely on download; paid packs are settled by
//! [`crate::core::settlement::download_curated_pack`]. Because share codes
//! are unguessable, owner checks return [`Error::NotFound`] rather than a
//! permission error, so a wrong owner cannot confirm a pack exists.

use crate::{
    entities::{CuratedPack, CuratedPackTrack, Track, curated_pack, curated_pack_track, track},
    errors::{Error, Result},
};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Length of the opaque code embedded in share links.
const SHARE_CODE_LEN: usize = 8;

/// Generates a share code no existing pack uses, re-rolling on collision.
async fn generate_share_code<C>(conn: &C) -> Result<String>
where
    C: ConnectionTrait,
{
    loop {
        let code: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SHARE_CODE_LEN)
            .map(char::from)
            .collect();

        let taken = CuratedPack::find()
            .filter(curated_pack::Column::ShareCode.eq(&code))
            .one(conn)
            .await?
            .is_some();
        if !taken {
            return Ok(code);
        }
    }
}

/// Creates a curated pack from a sequence of existing active tracks.
///
/// Member order follows the given sequence. Every referenced track must exist
/// and be active; duplicate ids and empty selections are rejected.
pub async fn create_curated_pack(
    db: &DatabaseConnection,
    owner_id: i64,
    name: String,
    description: Option<String>,
    is_free: bool,
    track_ids: &[i64],
) -> Result<curated_pack::Model> {
    if name.trim().is_empty() {
        return Err(Error::Invalid {
            message: "curated pack name cannot be empty".to_string(),
        });
    }
    if track_ids.is_empty() {
        return Err(Error::Invalid {
            message: "curated pack needs at least one track".to_string(),
        });
    }
    let mut seen = HashSet::new();
    for track_id in track_ids {
        if !seen.insert(*track_id) {
            return Err(Error::Invalid {
                message: format!("duplicate track in selection: {track_id}"),
            });
        }
    }

    let txn = db.begin().await?;

    for track_id in track_ids {
        crate::core::catalog::get_active_track(&txn, *track_id).await?;
    }

    let share_code = generate_share_code(&txn).await?;
    let now = chrono::Utc::now();
    let pack = curated_pack::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(name.trim().to_string()),
        description: Set(description),
        share_code: Set(share_code),
        is_free: Set(is_free),
        view_count: Set(0),
        download_count: Set(0),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let pack = pack.insert(&txn).await?;

    for (position, track_id) in track_ids.iter().enumerate() {
        let member = curated_pack_track::ActiveModel {
            curated_pack_id: Set(pack.id),
            track_id: Set(*track_id),
            track_order: Set(i32::try_from(position).unwrap_or(i32::MAX)),
            added_at: Set(now),
            ..Default::default()
        };
        member.insert(&txn).await?;
    }

    txn.commit().await?;
    info!(pack_id = pack.id, owner_id, tracks = track_ids.len(), "curated pack created");
    Ok(pack)
}

/// Finds an active curated pack by its share code.
pub async fn get_by_share_code<C>(conn: &C, share_code: &str) -> Result<curated_pack::Model>
where
    C: ConnectionTrait,
{
    CuratedPack::find()
        .filter(curated_pack::Column::ShareCode.eq(share_code))
        .filter(curated_pack::Column::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found("curated pack", share_code))
}

/// Records a view of the public share page. Returns the new view count.
pub async fn record_view(db: &DatabaseConnection, share_code: &str) -> Result<i64> {
    let pack = get_by_share_code(db, share_code).await?;

    CuratedPack::update_many()
        .col_expr(
            curated_pack::Column::ViewCount,
            Expr::col(curated_pack::Column::ViewCount).add(1),
        )
        .filter(curated_pack::Column::Id.eq(pack.id))
        .exec(db)
        .await?;

    // Re-read after the increment so concurrent views are reflected
    let pack = CuratedPack::find_by_id(pack.id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("curated pack", share_code))?;
    Ok(pack.view_count)
}

/// The pack's member tracks in `track_order` (ties by membership id), with
/// soft-deleted tracks filtered out.
pub async fn curated_track_list<C>(conn: &C, pack_id: i64) -> Result<Vec<track::Model>>
where
    C: ConnectionTrait,
{
    let members = CuratedPackTrack::find()
        .filter(curated_pack_track::Column::CuratedPackId.eq(pack_id))
        .order_by_asc(curated_pack_track::Column::TrackOrder)
        .order_by_asc(curated_pack_track::Column::Id)
        .all(conn)
        .await?;

    let track_ids: Vec<i64> = members.iter().map(|m| m.track_id).collect();
    let mut tracks: HashMap<i64, track::Model> = Track::find()
        .filter(track::Column::Id.is_in(track_ids))
        .filter(track::Column::IsActive.eq(true))
        .all(conn)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    Ok(members
        .iter()
        .filter_map(|m| tracks.remove(&m.track_id))
        .collect())
}

/// Bumps the pack's aggregate download counter. Settlement-internal.
pub(crate) async fn increment_downloads<C>(conn: &C, pack_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    CuratedPack::update_many()
        .col_expr(
            curated_pack::Column::DownloadCount,
            Expr::col(curated_pack::Column::DownloadCount).add(1),
        )
        .filter(curated_pack::Column::Id.eq(pack_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Soft deletes a curated pack. Only the owner may do this; anyone else sees
/// [`Error::NotFound`].
pub async fn deactivate_curated_pack(
    db: &DatabaseConnection,
    owner_id: i64,
    pack_id: i64,
) -> Result<curated_pack::Model> {
    let pack = CuratedPack::find_by_id(pack_id)
        .one(db)
        .await?
        .filter(|p| p.is_active && p.owner_id == owner_id)
        .ok_or_else(|| Error::not_found("curated pack", pack_id))?;

    let mut pack: curated_pack::ActiveModel = pack.into();
    pack.is_active = Set(false);
    pack.updated_at = Set(chrono::Utc::now());
    pack.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{create_test_track, setup_test_db};

    #[tokio::test]
    async fn test_create_curated_pack_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let track = create_test_track(&db, "Seed", 1).await?;

        let result =
            create_curated_pack(&db, 1, "  ".to_string(), None, false, &[track.id]).await;
        assert!(matches!(result.unwrap_err(), Error::Invalid { .. }));

        let result = create_curated_pack(&db, 1, "Empty".to_string(), None, false, &[]).await;
        assert!(matches!(result.unwrap_err(), Error::Invalid { .. }));

        let result = create_curated_pack(
            &db,
            1,
            "Dupes".to_string(),
            None,
            false,
            &[track.id, track.id],
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Invalid { .. }));

        let result =
            create_curated_pack(&db, 1, "Ghost".to_string(), None, false, &[track.id, 999]).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_share_code_lookup_and_view_counter() -> Result<()> {
        let db = setup_test_db().await?;
        let track = create_test_track(&db, "Shared", 1).await?;

        let pack = create_curated_pack(
            &db,
            1,
            "For Sarah".to_string(),
            Some("road trip mix".to_string()),
            true,
            &[track.id],
        )
        .await?;
        assert_eq!(pack.share_code.len(), SHARE_CODE_LEN);

        let found = get_by_share_code(&db, &pack.share_code).await?;
        assert_eq!(found.id, pack.id);
        assert!(found.is_free);

        assert_eq!(record_view(&db, &pack.share_code).await?, 1);
        assert_eq!(record_view(&db, &pack.share_code).await?, 2);

        // A view landing concurrently between the read and the increment
        // shows up in the returned count
        CuratedPack::update_many()
            .col_expr(
                curated_pack::Column::ViewCount,
                Expr::col(curated_pack::Column::ViewCount).add(1),
            )
            .filter(curated_pack::Column::Id.eq(pack.id))
            .exec(&db)
            .await?;
        assert_eq!(record_view(&db, &pack.share_code).await?, 4);

        let result = get_by_share_code(&db, "nope1234").await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_curated_track_list_order_and_soft_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_track(&db, "A", 1).await?;
        let b = create_test_track(&db, "B", 2).await?;
        let c = create_test_track(&db, "C", 3).await?;

        // Selection order becomes track_order
        let pack = create_curated_pack(
            &db,
            9,
            "Mix".to_string(),
            None,
            false,
            &[c.id, a.id, b.id],
        )
        .await?;

        let listed = curated_track_list(&db, pack.id).await?;
        let ids: Vec<i64> = listed.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![c.id, a.id, b.id]);

        // A soft-deleted member disappears from the listing
        crate::core::catalog::deactivate_track(&db, a.id).await?;
        let listed = curated_track_list(&db, pack.id).await?;
        let ids: Vec<i64> = listed.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![c.id, b.id]);

        Ok(())
    }

    #[tokio::test]
    async fn test_deactivate_is_owner_only() -> Result<()> {
        let db = setup_test_db().await?;
        let track = create_test_track(&db, "Mine", 1).await?;
        let pack =
            create_curated_pack(&db, 5, "Owned".to_string(), None, false, &[track.id]).await?;

        // Someone else cannot even observe the pack exists
        let result = deactivate_curated_pack(&db, 6, pack.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        deactivate_curated_pack(&db, 5, pack.id).await?;
        let result = get_by_share_code(&db, &pack.share_code).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }
}
