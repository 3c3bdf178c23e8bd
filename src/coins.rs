// src/coins.rs
use std::collections::HashMap;

use sqlx::{PgPool, Row};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::{Coin, CoinSelection, CoinTally, CoinVote, PollState, VoteRequest};

pub const TOP_COINS: i64 = 3;

/// Storage for the coin voting feature: the selected coins, one vote per
/// user per coin, and the denormalized per-coin tally.
#[derive(Clone)]
pub struct CoinStore {
    pool: PgPool,
}

impl CoinStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn list_coins(&self) -> Result<Vec<Coin>, StoreError> {
        let coins = sqlx::query_as::<_, Coin>("SELECT id, symbol, price FROM coins ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(coins)
    }

    /// Replace the selected coins.
    ///
    /// Coins that stay selected keep their id, price, votes and tally. Votes
    /// and tallies of coins that are dropped cascade away with them. The
    /// result follows the order of the selection.
    pub async fn select_coins(&self, selection: &CoinSelection) -> Result<Vec<Coin>, StoreError> {
        let symbols = selection.normalized()?;

        let mut tx = self.pool.begin().await?;

        // Drop coins that are no longer selected
        let dropped = sqlx::query("DELETE FROM coins WHERE symbol <> ALL($1)")
            .bind(&symbols)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for symbol in &symbols {
            sqlx::query("INSERT INTO coins (symbol) VALUES ($1) ON CONFLICT (symbol) DO NOTHING")
                .bind(symbol)
                .execute(&mut *tx)
                .await?;
        }

        let coins = sqlx::query_as::<_, Coin>(
            r#"
            SELECT id, symbol, price
            FROM coins
            WHERE symbol = ANY($1)
            ORDER BY array_position($1, symbol)
            "#,
        )
        .bind(&symbols)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(count = coins.len(), dropped, "coins selected");
        Ok(coins)
    }

    /// Returns `false` if the symbol is not currently selected.
    pub async fn update_price(&self, symbol: &str, price: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE coins SET price = $1 WHERE symbol = $2")
            .bind(price)
            .bind(symbol)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a vote and bump the coin's tally in one transaction.
    ///
    /// A repeated vote fails with `StoreError::Duplicate`; a vote for a coin
    /// that is not selected fails with `StoreError::MissingReference`.
    pub async fn cast_vote(&self, request: &VoteRequest) -> Result<CoinVote, StoreError> {
        let (symbol, user_id) = request.normalized()?;

        let mut tx = self.pool.begin().await?;

        let vote = sqlx::query_as::<_, CoinVote>(
            r#"
            INSERT INTO coin_votes (coin_symbol, user_id)
            VALUES ($1, $2)
            RETURNING id, coin_symbol, user_id, created_at
            "#,
        )
        .bind(&symbol)
        .bind(&user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO coin_vote_tallies (symbol, votes)
            VALUES ($1, 1)
            ON CONFLICT (symbol) DO UPDATE
            SET votes = coin_vote_tallies.votes + 1
            "#,
        )
        .bind(&symbol)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(symbol = %symbol, "coin vote recorded");
        Ok(vote)
    }

    /// Selected coins alongside per-coin vote counts.
    pub async fn poll_state(&self) -> Result<PollState, StoreError> {
        let coins = self.list_coins().await?;

        let rows = sqlx::query(
            "SELECT coin_symbol, COUNT(*) AS vote_count FROM coin_votes GROUP BY coin_symbol",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut votes = HashMap::with_capacity(rows.len());
        for row in rows {
            let symbol: String = row.try_get("coin_symbol")?;
            let count: i64 = row.try_get("vote_count")?;
            votes.insert(symbol, count);
        }

        Ok(PollState { coins, votes })
    }

    /// Most voted coins from the tally table, highest first.
    pub async fn top_coins(&self, limit: i64) -> Result<Vec<CoinTally>, StoreError> {
        let top = sqlx::query_as::<_, CoinTally>(
            r#"
            SELECT symbol, votes
            FROM coin_vote_tallies
            ORDER BY votes DESC, symbol
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(top)
    }
}
