//! Core business logic for the `TrackVault` ledger.
//!
//! Everything in here is framework-agnostic: functions take a SeaORM
//! connection (or transaction) and already-authenticated user ids, and return
//! `Result` values the surrounding web layer renders however it likes. All
//! settlement paths are all-or-nothing - a failure leaves wallets, the
//! ledger, and the ownership registry untouched.

/// Catalog operations - tracks, packs, derived pricing, play counters
pub mod catalog;
/// Curated packs - share codes, membership, view counters
pub mod curated;
/// Ownership registry - who owns which track
pub mod library;
/// Bounded retry with backoff for transient store failures
pub mod retry;
/// Settlement engine - single-track and curated-pack purchases
pub mod settlement;
/// Ledger store - wallets, credits, debits, the append-only ledger
pub mod wallet;
