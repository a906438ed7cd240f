//! Settlement engine - the atomic balance-and-ownership mutations behind
//! every purchase.
//!
//! Both entry points run inside a single store transaction and are re-run
//! from scratch on transient store failures, so a caller either sees the
//! whole settlement or none of it. Per-track pricing is a fixed business
//! rule: one token per track, regardless of any stored `token_cost` column.
//! The creator receives `max(1, floor(cost * 0.8))` of each sale; the
//! platform margin is the unmaterialized remainder - deliberately never
//! ledgered as a wallet of its own.

use crate::{
    core::{catalog, curated, library, retry::with_store_retry, wallet},
    entities::{curated_pack, track},
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::info;

/// Fixed price of one track in tokens. The `token_cost` stored on tracks is
/// legacy/display-only and never consulted.
pub const TRACK_UNIT_COST: i64 = 1;

/// Creator's percentage of each sale.
pub const CREATOR_SHARE_PERCENT: i64 = 80;

/// Tokens the creator receives for a sale of `cost` tokens. The creator
/// always receives at least one token, even when the floor of the percentage
/// split would round to zero.
#[must_use]
pub const fn creator_share(cost: i64) -> i64 {
    let share = cost * CREATOR_SHARE_PERCENT / 100;
    if share < 1 { 1 } else { share }
}

/// Result of a single-track purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseOutcome {
    /// True when the buyer already owned the track - nothing was charged
    pub already_owned: bool,
    /// Tokens debited from the buyer by this call
    pub tokens_spent: i64,
    /// Buyer's balance after the call
    pub new_balance: i64,
}

/// Result of a curated-pack download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackDownloadOutcome {
    /// The pack is flagged free: tracks are handed over with no ledger or
    /// ownership side effects at all.
    Free {
        /// The downloadable tracks, in pack order
        tracks: Vec<track::Model>,
    },
    /// A paid settlement (possibly of zero tracks, when everything requested
    /// was already owned).
    Purchased {
        /// Tracks newly added to the buyer's library
        tracks_added: i64,
        /// Tokens debited from the buyer
        tokens_spent: i64,
        /// Buyer's balance after the call
        new_balance: i64,
    },
}

/// Purchases a single track for the buyer, or hands it over for free if the
/// buyer already owns it.
///
/// Charging, crediting the creator, recording ownership, and bumping the
/// track's download counter commit as one atomic unit. Losing a concurrent
/// race for first ownership resolves as an "already owned" outcome rather
/// than an error. Transient store failures are retried with backoff.
pub async fn purchase_track(
    db: &DatabaseConnection,
    buyer_id: i64,
    track_id: i64,
) -> Result<PurchaseOutcome> {
    with_store_retry("purchase_track", || {
        settle_track_purchase(db, buyer_id, track_id)
    })
    .await
}

async fn settle_track_purchase(
    db: &DatabaseConnection,
    buyer_id: i64,
    track_id: i64,
) -> Result<PurchaseOutcome> {
    let txn = db.begin().await?;
    let track = catalog::get_active_track(&txn, track_id).await?;

    // Downloads after purchase are free: bump the counter, touch no wallet.
    if library::is_owned(&txn, buyer_id, track_id).await? {
        let outcome = redownload_outcome(&txn, buyer_id, track_id).await?;
        txn.commit().await?;
        return Ok(outcome);
    }

    let cost = TRACK_UNIT_COST;
    let new_balance = wallet::debit(
        &txn,
        buyer_id,
        cost,
        Some("track_download"),
        Some(track_id),
        &format!("Downloaded: {}", track.title),
    )
    .await?;

    let share = creator_share(cost);
    wallet::credit(
        &txn,
        track.creator_id,
        share,
        wallet::EntryKind::Earn,
        Some("track_sale"),
        Some(track_id),
        &format!("Sale: {}", track.title),
    )
    .await?;

    match library::record_ownership(&txn, buyer_id, track_id, cost).await {
        Ok(_) => {}
        Err(Error::Conflict { .. }) => {
            // Lost the first-ownership race. Discard the debit and credit
            // entirely and resolve against the winner's record.
            txn.rollback().await?;
            return resolve_lost_purchase_race(db, buyer_id, track_id).await;
        }
        Err(other) => return Err(other),
    }

    catalog::increment_track_downloads(&txn, track_id).await?;
    txn.commit().await?;

    info!(
        buyer_id,
        track_id,
        cost,
        creator_id = track.creator_id,
        share,
        "track purchase settled"
    );
    Ok(PurchaseOutcome {
        already_owned: false,
        tokens_spent: cost,
        new_balance,
    })
}

/// Resolves a purchase whose ownership insert lost a concurrent race: the
/// winner's committed row is authoritative, so the loser re-runs as a plain
/// re-download in a fresh transaction.
async fn resolve_lost_purchase_race(
    db: &DatabaseConnection,
    buyer_id: i64,
    track_id: i64,
) -> Result<PurchaseOutcome> {
    let txn = db.begin().await?;
    let outcome = redownload_outcome(&txn, buyer_id, track_id).await?;
    txn.commit().await?;
    Ok(outcome)
}

/// The zero-charge path for a track the buyer already owns. Reads the balance
/// without creating a wallet, so a re-download mutates nothing but the
/// ownership record's own counter.
async fn redownload_outcome<C>(conn: &C, buyer_id: i64, track_id: i64) -> Result<PurchaseOutcome>
where
    C: ConnectionTrait,
{
    library::record_redownload(conn, buyer_id, track_id).await?;
    let balance = wallet::get_wallet(conn, buyer_id)
        .await?
        .map_or(0, |w| w.balance);
    Ok(PurchaseOutcome {
        already_owned: true,
        tokens_spent: 0,
        new_balance: balance,
    })
}

/// Downloads tracks from a curated pack, settling payment for any the buyer
/// does not already own.
///
/// `buyer` may be `None` only for packs flagged free; free downloads bypass
/// the ledger and the ownership registry entirely. For paid packs the charge
/// is one token per unowned track with no bundle discount, debited from the
/// wallet once but logged per track so the audit trail names each item, with
/// `balance_after` walking the sequential running total. The pack's download
/// counter bumps once per call regardless of how many tracks were charged.
pub async fn download_curated_pack(
    db: &DatabaseConnection,
    buyer: Option<i64>,
    share_code: &str,
    requested_track_ids: Option<&[i64]>,
) -> Result<PackDownloadOutcome> {
    with_store_retry("download_curated_pack", || {
        settle_pack_download(db, buyer, share_code, requested_track_ids)
    })
    .await
}

async fn settle_pack_download(
    db: &DatabaseConnection,
    buyer: Option<i64>,
    share_code: &str,
    requested_track_ids: Option<&[i64]>,
) -> Result<PackDownloadOutcome> {
    // Re-partitions from scratch after a lost first-ownership race; each
    // re-run sees the winner's row on the owned side, so the unowned set
    // strictly shrinks and the loop terminates.
    loop {
        let txn = db.begin().await?;
        let pack = curated::get_by_share_code(&txn, share_code).await?;

        let members = curated::curated_track_list(&txn, pack.id).await?;
        let tracks: Vec<track::Model> = match requested_track_ids {
            Some(ids) => members.into_iter().filter(|t| ids.contains(&t.id)).collect(),
            None => members,
        };
        if tracks.is_empty() {
            return Err(Error::Invalid {
                message: "no tracks to download".to_string(),
            });
        }

        if pack.is_free {
            curated::increment_downloads(&txn, pack.id).await?;
            txn.commit().await?;
            return Ok(PackDownloadOutcome::Free { tracks });
        }

        let buyer_id = buyer.ok_or_else(|| Error::Invalid {
            message: "login required to download a paid pack".to_string(),
        })?;

        let mut unowned = Vec::new();
        for track in &tracks {
            if !library::is_owned(&txn, buyer_id, track.id).await? {
                unowned.push(track);
            }
        }

        if unowned.is_empty() {
            // Everything requested is already owned; no charge, but the pack
            // still served a download.
            curated::increment_downloads(&txn, pack.id).await?;
            let balance = wallet::get_wallet(&txn, buyer_id)
                .await?
                .map_or(0, |w| w.balance);
            txn.commit().await?;
            return Ok(PackDownloadOutcome::Purchased {
                tracks_added: 0,
                tokens_spent: 0,
                new_balance: balance,
            });
        }

        let total_cost = i64::try_from(unowned.len()).unwrap_or(i64::MAX);
        let buyer_wallet = wallet::get_or_create_wallet(&txn, buyer_id).await?;
        if buyer_wallet.balance < total_cost {
            return Err(Error::InsufficientFunds {
                required: total_cost,
                available: buyer_wallet.balance,
            });
        }

        // One aggregated wallet mutation; the ledger keeps a per-track trail
        // whose balance_after values walk the running total as if each token
        // had been deducted in sequence.
        wallet::adjust_balance(&txn, buyer_id, -total_cost, wallet::LifetimeCounter::Spent)
            .await?;
        let new_balance =
            match charge_unowned(&txn, buyer_id, &pack, &unowned, buyer_wallet.balance).await {
                Ok(balance) => balance,
                Err(Error::Conflict { .. }) => {
                    // A concurrent purchase claimed one of these tracks
                    // between the partition and the insert. Discard the whole
                    // attempt and re-partition.
                    txn.rollback().await?;
                    continue;
                }
                Err(other) => return Err(other),
            };

        curated::increment_downloads(&txn, pack.id).await?;
        txn.commit().await?;

        info!(
            buyer_id,
            pack_id = pack.id,
            tracks_added = unowned.len(),
            tokens_spent = total_cost,
            "curated pack download settled"
        );
        return Ok(PackDownloadOutcome::Purchased {
            tracks_added: i64::try_from(unowned.len()).unwrap_or(i64::MAX),
            tokens_spent: total_cost,
            new_balance,
        });
    }
}

/// Records ownership and a `spend` ledger entry for each unowned track; the
/// wallet row itself was already debited in aggregate. `balance_after` walks
/// the running total from `start_balance`. Surfaces [`Error::Conflict`] when
/// an ownership insert loses a concurrent race, in which case the caller
/// discards the surrounding transaction.
async fn charge_unowned<C>(
    conn: &C,
    buyer_id: i64,
    pack: &curated_pack::Model,
    unowned: &[&track::Model],
    start_balance: i64,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    let mut running_balance = start_balance;
    for track in unowned {
        running_balance -= TRACK_UNIT_COST;
        library::record_ownership(conn, buyer_id, track.id, TRACK_UNIT_COST).await?;
        wallet::append_entry(
            conn,
            buyer_id,
            wallet::EntryKind::Spend,
            -TRACK_UNIT_COST,
            running_balance,
            Some("curated_pack_download"),
            Some(track.id),
            &format!("Downloaded from curated pack: {}", pack.name),
        )
        .await?;
    }
    Ok(running_balance)
}
