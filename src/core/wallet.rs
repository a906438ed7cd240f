//! Ledger store - wallet balances and the append-only token ledger.
//!
//! This module owns every wallet mutation in the system. Balance changes go
//! through [`credit`] and [`debit`], which update the wallet row with an
//! atomic column expression and append a matching ledger entry (with a
//! `balance_after` snapshot) in the caller's transaction, so the mutation and
//! its audit record commit or roll back together. Wallets are created lazily
//! with a zero balance; the signup bonus has exactly one grant path,
//! [`grant_signup_bonus`], so a lazily-created wallet can never be
//! double-funded.

use crate::{
    config::economy::EconomyConfig,
    entities::{LedgerEntry, Wallet, ledger_entry, wallet},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info};

/// Kind of monetary event recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// One-time signup grant
    Bonus,
    /// Token package top-up (stub, no payment processor)
    Purchase,
    /// Tokens spent on a download
    Spend,
    /// Sale proceeds credited to a creator
    Earn,
}

impl EntryKind {
    /// The string stored in the `kind` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bonus => "bonus",
            Self::Purchase => "purchase",
            Self::Spend => "spend",
            Self::Earn => "earn",
        }
    }
}

/// Which lifetime counter a balance adjustment maintains alongside `balance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LifetimeCounter {
    Spent,
    Earned,
    Neither,
}

/// Outcome of a token package purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenGrant {
    /// Tokens credited by the package
    pub tokens_added: i64,
    /// Wallet balance after the credit
    pub new_balance: i64,
}

/// Finds a user's wallet without creating one. Read-only.
pub async fn get_wallet<C>(conn: &C, user_id: i64) -> Result<Option<wallet::Model>>
where
    C: ConnectionTrait,
{
    Wallet::find()
        .filter(wallet::Column::UserId.eq(user_id))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Gets a user's wallet, creating an empty one on first reference.
///
/// Lazy creation grants zero tokens. The signup bonus is granted only by
/// [`grant_signup_bonus`] at account creation, so repeated lazy creations can
/// never re-fund a user. Two racing creators are resolved by the unique
/// constraint on `user_id`: the loser re-reads the winner's row.
pub async fn get_or_create_wallet<C>(conn: &C, user_id: i64) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = get_wallet(conn, user_id).await? {
        return Ok(existing);
    }

    let now = chrono::Utc::now();
    let fresh = wallet::ActiveModel {
        user_id: Set(user_id),
        balance: Set(0),
        total_spent: Set(0),
        total_earned: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match fresh.insert(conn).await {
        Ok(created) => {
            debug!(user_id, "created wallet lazily with zero balance");
            Ok(created)
        }
        Err(err) if crate::errors::is_unique_violation(&err) => {
            // Lost a creation race; the winner's row is authoritative.
            get_wallet(conn, user_id)
                .await?
                .ok_or_else(|| Error::not_found("wallet", user_id))
        }
        Err(err) => Err(err.into()),
    }
}

/// Applies `delta` to the wallet balance with a single atomic column
/// expression, bumping the matching lifetime counter. The caller has already
/// verified the wallet exists and (for debits) that the balance covers it.
/// Crate-visible for batch settlement, which aggregates the wallet mutation
/// while appending per-track ledger entries itself.
pub(crate) async fn adjust_balance<C>(
    conn: &C,
    user_id: i64,
    delta: i64,
    counter: LifetimeCounter,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut update = Wallet::update_many()
        .col_expr(
            wallet::Column::Balance,
            Expr::col(wallet::Column::Balance).add(delta),
        )
        .col_expr(wallet::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(wallet::Column::UserId.eq(user_id));

    update = match counter {
        LifetimeCounter::Spent => update.col_expr(
            wallet::Column::TotalSpent,
            Expr::col(wallet::Column::TotalSpent).add(-delta),
        ),
        LifetimeCounter::Earned => update.col_expr(
            wallet::Column::TotalEarned,
            Expr::col(wallet::Column::TotalEarned).add(delta),
        ),
        LifetimeCounter::Neither => update,
    };

    update.exec(conn).await?;
    Ok(())
}

/// Appends an immutable ledger entry. Part of every balance mutation's atomic
/// unit; also used directly by batch settlement, which aggregates the wallet
/// debit but keeps a per-track audit trail.
pub async fn append_entry<C>(
    conn: &C,
    user_id: i64,
    kind: EntryKind,
    amount: i64,
    balance_after: i64,
    reference_type: Option<&str>,
    reference_id: Option<i64>,
    description: &str,
) -> Result<ledger_entry::Model>
where
    C: ConnectionTrait,
{
    let entry = ledger_entry::ActiveModel {
        user_id: Set(user_id),
        kind: Set(kind.as_str().to_string()),
        amount: Set(amount),
        balance_after: Set(balance_after),
        reference_type: Set(reference_type.map(ToString::to_string)),
        reference_id: Set(reference_id),
        description: Set(description.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    entry.insert(conn).await.map_err(Into::into)
}

/// Credits `amount` tokens to a user's wallet and appends the matching ledger
/// entry. `Earn`-kind credits also advance `total_earned`.
///
/// # Errors
/// Returns [`Error::Invalid`] for non-positive amounts; nothing is applied.
pub async fn credit<C>(
    conn: &C,
    user_id: i64,
    amount: i64,
    kind: EntryKind,
    reference_type: Option<&str>,
    reference_id: Option<i64>,
    description: &str,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    if amount <= 0 {
        return Err(Error::Invalid {
            message: format!("credit amount must be positive, got {amount}"),
        });
    }

    let wallet = get_or_create_wallet(conn, user_id).await?;
    let new_balance = wallet.balance + amount;

    let counter = if kind == EntryKind::Earn {
        LifetimeCounter::Earned
    } else {
        LifetimeCounter::Neither
    };
    adjust_balance(conn, user_id, amount, counter).await?;
    append_entry(
        conn,
        user_id,
        kind,
        amount,
        new_balance,
        reference_type,
        reference_id,
        description,
    )
    .await?;

    Ok(new_balance)
}

/// Debits `amount` tokens from a user's wallet and appends a `spend` ledger
/// entry with a negative amount.
///
/// # Errors
/// Returns [`Error::Invalid`] for non-positive amounts and
/// [`Error::InsufficientFunds`] when the balance cannot cover the debit; in
/// both cases nothing is applied.
pub async fn debit<C>(
    conn: &C,
    user_id: i64,
    amount: i64,
    reference_type: Option<&str>,
    reference_id: Option<i64>,
    description: &str,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    if amount <= 0 {
        return Err(Error::Invalid {
            message: format!("debit amount must be positive, got {amount}"),
        });
    }

    let wallet = get_or_create_wallet(conn, user_id).await?;
    if wallet.balance < amount {
        return Err(Error::InsufficientFunds {
            required: amount,
            available: wallet.balance,
        });
    }

    let new_balance = wallet.balance - amount;
    adjust_balance(conn, user_id, -amount, LifetimeCounter::Spent).await?;
    append_entry(
        conn,
        user_id,
        EntryKind::Spend,
        -amount,
        new_balance,
        reference_type,
        reference_id,
        description,
    )
    .await?;

    Ok(new_balance)
}

/// Grants the one-time signup bonus, creating the wallet if needed.
///
/// This is the single authoritative bonus path, called once at account
/// creation. A user who already holds a `bonus` ledger entry gets
/// [`Error::Conflict`] and no tokens - re-registration and
/// lazy-creation races cannot double-fund a wallet.
pub async fn grant_signup_bonus(
    db: &DatabaseConnection,
    economy: &EconomyConfig,
    user_id: i64,
) -> Result<wallet::Model> {
    let txn = db.begin().await?;

    let prior_bonus = LedgerEntry::find()
        .filter(ledger_entry::Column::UserId.eq(user_id))
        .filter(ledger_entry::Column::Kind.eq(EntryKind::Bonus.as_str()))
        .one(&txn)
        .await?;
    if prior_bonus.is_some() {
        return Err(Error::Conflict {
            message: format!("signup bonus already granted to user {user_id}"),
        });
    }

    get_or_create_wallet(&txn, user_id).await?;
    if economy.signup_bonus > 0 {
        credit(
            &txn,
            user_id,
            economy.signup_bonus,
            EntryKind::Bonus,
            Some("signup_bonus"),
            None,
            "Welcome bonus tokens",
        )
        .await?;
    }

    let wallet = get_wallet(&txn, user_id)
        .await?
        .ok_or_else(|| Error::not_found("wallet", user_id))?;
    txn.commit().await?;

    info!(user_id, bonus = economy.signup_bonus, "granted signup bonus");
    Ok(wallet)
}

/// Credits a purchased token package to the user's wallet (stub - the price
/// is display-only, no payment gateway is invoked).
///
/// # Errors
/// Returns [`Error::Invalid`] when `package_id` is not in the catalog.
pub async fn purchase_token_package(
    db: &DatabaseConnection,
    economy: &EconomyConfig,
    user_id: i64,
    package_id: &str,
) -> Result<TokenGrant> {
    let package = economy.package(package_id).ok_or_else(|| Error::Invalid {
        message: format!("unknown token package: {package_id}"),
    })?;

    let txn = db.begin().await?;
    let new_balance = credit(
        &txn,
        user_id,
        package.tokens,
        EntryKind::Purchase,
        Some("token_purchase"),
        None,
        &format!("Purchased {} tokens", package.tokens),
    )
    .await?;
    txn.commit().await?;

    info!(user_id, package_id, tokens = package.tokens, "token package credited");
    Ok(TokenGrant {
        tokens_added: package.tokens,
        new_balance,
    })
}

/// Returns a user's ledger history, newest event first.
pub async fn get_ledger_history(
    db: &DatabaseConnection,
    user_id: i64,
    limit: u64,
) -> Result<Vec<ledger_entry::Model>> {
    LedgerEntry::find()
        .filter(ledger_entry::Column::UserId.eq(user_id))
        .order_by_desc(ledger_entry::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}
