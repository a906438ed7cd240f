//! Ownership registry - which user owns which track.
//!
//! Ownership is a durable grant: a library entry is created exactly once per
//! (user, track) pair, and later downloads only bump its counter and
//! timestamp with no further charge. Creation is deliberately not an upsert -
//! the unique index turns a duplicate create into [`Error::Conflict`], which
//! settlement uses as the tie-breaker for racing purchases.

use crate::{
    entities::{LibraryEntry, library_entry},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};

/// Whether the user already owns the track.
pub async fn is_owned<C>(conn: &C, user_id: i64, track_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    get_entry(conn, user_id, track_id).await.map(|e| e.is_some())
}

/// Finds the ownership record for a (user, track) pair, if any.
pub async fn get_entry<C>(
    conn: &C,
    user_id: i64,
    track_id: i64,
) -> Result<Option<library_entry::Model>>
where
    C: ConnectionTrait,
{
    LibraryEntry::find()
        .filter(library_entry::Column::UserId.eq(user_id))
        .filter(library_entry::Column::TrackId.eq(track_id))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Records first-time ownership of a track.
///
/// The new entry starts with one download already counted, since settlement
/// hands the track over as part of the purchase.
///
/// # Errors
/// Returns [`Error::Conflict`] if an entry already exists for the pair -
/// callers treat this as "already owned", not as a hard failure.
pub async fn record_ownership<C>(
    conn: &C,
    user_id: i64,
    track_id: i64,
    tokens_spent: i64,
) -> Result<library_entry::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    let entry = library_entry::ActiveModel {
        user_id: Set(user_id),
        track_id: Set(track_id),
        tokens_spent: Set(tokens_spent),
        purchased_at: Set(now),
        downloaded_at: Set(Some(now)),
        download_count: Set(1),
        ..Default::default()
    };

    match entry.insert(conn).await {
        Ok(created) => Ok(created),
        Err(err) if crate::errors::is_unique_violation(&err) => Err(Error::Conflict {
            message: format!("user {user_id} already owns track {track_id}"),
        }),
        Err(err) => Err(err.into()),
    }
}

/// Bumps the download counter and timestamp on an existing ownership record.
///
/// # Errors
/// Returns [`Error::NotFound`] if the user does not own the track.
pub async fn record_redownload<C>(
    conn: &C,
    user_id: i64,
    track_id: i64,
) -> Result<library_entry::Model>
where
    C: ConnectionTrait,
{
    let entry = get_entry(conn, user_id, track_id)
        .await?
        .ok_or_else(|| Error::not_found("library entry", format!("{user_id}/{track_id}")))?;

    LibraryEntry::update_many()
        .col_expr(
            library_entry::Column::DownloadCount,
            Expr::col(library_entry::Column::DownloadCount).add(1),
        )
        .col_expr(
            library_entry::Column::DownloadedAt,
            Expr::value(Some(chrono::Utc::now())),
        )
        .filter(library_entry::Column::Id.eq(entry.id))
        .exec(conn)
        .await?;

    LibraryEntry::find_by_id(entry.id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found("library entry", entry.id))
}

/// Returns everything the user owns, most recent purchase first.
pub async fn get_user_library(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<library_entry::Model>> {
    LibraryEntry::find()
        .filter(library_entry::Column::UserId.eq(user_id))
        .order_by_desc(library_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{create_test_track, setup_test_db};

    #[tokio::test]
    async fn test_record_ownership_once() -> Result<()> {
        let db = setup_test_db().await?;
        let track = create_test_track(&db, "Night Drive", 10).await?;

        assert!(!is_owned(&db, 1, track.id).await?);

        let entry = record_ownership(&db, 1, track.id, 1).await?;
        assert_eq!(entry.tokens_spent, 1);
        assert_eq!(entry.download_count, 1);
        assert!(entry.downloaded_at.is_some());
        assert!(is_owned(&db, 1, track.id).await?);

        // Duplicate creation is a conflict, not a second grant
        let result = record_ownership(&db, 1, track.id, 1).await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));

        // A different user is unaffected
        assert!(!is_owned(&db, 2, track.id).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_redownload_bumps_counter() -> Result<()> {
        let db = setup_test_db().await?;
        let track = create_test_track(&db, "Night Drive", 10).await?;

        record_ownership(&db, 1, track.id, 1).await?;
        let entry = record_redownload(&db, 1, track.id).await?;
        assert_eq!(entry.download_count, 2);

        let entry = record_redownload(&db, 1, track.id).await?;
        assert_eq!(entry.download_count, 3);
        assert_eq!(entry.tokens_spent, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_redownload_requires_ownership() -> Result<()> {
        let db = setup_test_db().await?;
        let track = create_test_track(&db, "Night Drive", 10).await?;

        let result = record_redownload(&db, 1, track.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_user_library_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_track(&db, "First", 10).await?;
        let second = create_test_track(&db, "Second", 11).await?;

        record_ownership(&db, 1, first.id, 1).await?;
        record_ownership(&db, 1, second.id, 1).await?;
        record_ownership(&db, 2, first.id, 1).await?;

        let library = get_user_library(&db, 1).await?;
        assert_eq!(library.len(), 2);
        assert_eq!(library[0].track_id, second.id);
        assert_eq!(library[1].track_id, first.id);

        Ok(())
    }
}
