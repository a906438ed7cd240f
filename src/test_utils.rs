//! Shared test utilities for `TrackVault`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{catalog, curated, wallet},
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables and unique indexes
/// initialized. This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a standalone test track with sensible defaults.
///
/// # Defaults
/// * no pack membership, no track number
/// * `audio_url` derived from the title
/// * legacy `token_cost` of 5 - deliberately not the unit cost, so tests
///   catch any code path that trusts the stored field
pub async fn create_test_track(
    db: &DatabaseConnection,
    title: &str,
    creator_id: i64,
) -> Result<entities::track::Model> {
    catalog::create_track(
        db,
        title.to_string(),
        creator_id,
        None,
        format!("audio/{}.mp3", title.to_lowercase().replace(' ', "-")),
        5,
        None,
    )
    .await
}

/// Funds a user's wallet through the normal token-purchase credit path.
pub async fn fund_wallet(db: &DatabaseConnection, user_id: i64, tokens: i64) -> Result<i64> {
    wallet::credit(
        db,
        user_id,
        tokens,
        wallet::EntryKind::Purchase,
        Some("token_purchase"),
        None,
        &format!("Purchased {tokens} tokens"),
    )
    .await
}

/// Creates a curated pack over the given tracks with a default name.
pub async fn create_test_curated_pack(
    db: &DatabaseConnection,
    owner_id: i64,
    is_free: bool,
    track_ids: &[i64],
) -> Result<entities::curated_pack::Model> {
    curated::create_curated_pack(
        db,
        owner_id,
        "Test Curated Pack".to_string(),
        None,
        is_free,
        track_ids,
    )
    .await
}
