//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod curated_pack;
pub mod curated_pack_track;
pub mod ledger_entry;
pub mod library_entry;
pub mod pack;
pub mod track;
pub mod wallet;

// Re-export specific types to avoid conflicts
pub use curated_pack::{Column as CuratedPackColumn, Entity as CuratedPack, Model as CuratedPackModel};
pub use curated_pack_track::{
    Column as CuratedPackTrackColumn, Entity as CuratedPackTrack, Model as CuratedPackTrackModel,
};
pub use ledger_entry::{Column as LedgerEntryColumn, Entity as LedgerEntry, Model as LedgerEntryModel};
pub use library_entry::{
    Column as LibraryEntryColumn, Entity as LibraryEntry, Model as LibraryEntryModel,
};
pub use pack::{Column as PackColumn, Entity as Pack, Model as PackModel};
pub use track::{Column as TrackColumn, Entity as Track, Model as TrackModel};
pub use wallet::{Column as WalletColumn, Entity as Wallet, Model as WalletModel};
