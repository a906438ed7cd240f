//! Database configuration module for `TrackVault`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Schema generation uses `Schema::create_table_from_entity` so the database always
//! matches the entity definitions without hand-written SQL. The composite unique
//! indexes that settlement relies on as concurrency tie-breakers (one ownership
//! row per (user, track), one membership row per (curated pack, track)) are not
//! expressible as entity attributes and are created explicitly here.

use crate::entities::{
    CuratedPack, CuratedPackTrack, LedgerEntry, LibraryEntry, Pack, Track, Wallet,
    curated_pack_track, library_entry,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/trackvault.sqlite".to_string())
}

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL`
/// environment variable, falling back to a default local `SQLite` file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all database tables and unique indexes from the entity definitions.
///
/// Table creation uses `SeaORM`'s schema generation from the `DeriveEntityModel`
/// macros. The two composite unique indexes are appended afterwards: settlement
/// depends on them both for correctness (no duplicate ownership) and as the
/// tie-breaker that turns a lost purchase race into an "already owned" outcome.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let wallet_table = schema.create_table_from_entity(Wallet);
    let ledger_table = schema.create_table_from_entity(LedgerEntry);
    let track_table = schema.create_table_from_entity(Track);
    let pack_table = schema.create_table_from_entity(Pack);
    let library_table = schema.create_table_from_entity(LibraryEntry);
    let curated_table = schema.create_table_from_entity(CuratedPack);
    let curated_track_table = schema.create_table_from_entity(CuratedPackTrack);

    db.execute(builder.build(&wallet_table)).await?;
    db.execute(builder.build(&ledger_table)).await?;
    db.execute(builder.build(&track_table)).await?;
    db.execute(builder.build(&pack_table)).await?;
    db.execute(builder.build(&library_table)).await?;
    db.execute(builder.build(&curated_table)).await?;
    db.execute(builder.build(&curated_track_table)).await?;

    let library_unique = Index::create()
        .name("uniq_library_entries_user_track")
        .table(LibraryEntry)
        .col(library_entry::Column::UserId)
        .col(library_entry::Column::TrackId)
        .unique()
        .to_owned();
    db.execute(builder.build(&library_unique)).await?;

    let membership_unique = Index::create()
        .name("uniq_curated_pack_tracks_pack_track")
        .table(CuratedPackTrack)
        .col(curated_pack_track::Column::CuratedPackId)
        .col(curated_pack_track::Column::TrackId)
        .unique()
        .to_owned();
    db.execute(builder.build(&membership_unique)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        ledger_entry::Model as LedgerEntryModel, library_entry::Model as LibraryEntryModel,
        track::Model as TrackModel, wallet::Model as WalletModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<WalletModel> = Wallet::find().limit(1).all(&db).await?;
        let _: Vec<LedgerEntryModel> = LedgerEntry::find().limit(1).all(&db).await?;
        let _: Vec<TrackModel> = Track::find().limit(1).all(&db).await?;
        let _: Vec<LibraryEntryModel> = LibraryEntry::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_library_unique_index_enforced() -> Result<()> {
        use sea_orm::{ActiveModelTrait, Set};

        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let now = chrono::Utc::now();
        let entry = library_entry::ActiveModel {
            user_id: Set(1),
            track_id: Set(7),
            tokens_spent: Set(1),
            purchased_at: Set(now),
            downloaded_at: Set(None),
            download_count: Set(1),
            ..Default::default()
        };
        entry.insert(&db).await?;

        let duplicate = library_entry::ActiveModel {
            user_id: Set(1),
            track_id: Set(7),
            tokens_spent: Set(1),
            purchased_at: Set(now),
            downloaded_at: Set(None),
            download_count: Set(1),
            ..Default::default()
        };
        let result = duplicate.insert(&db).await;
        assert!(result.is_err());

        Ok(())
    }
}
