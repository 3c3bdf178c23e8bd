// src/models.rs
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

pub const MIN_POLL_OPTIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Poll {
    pub id: Uuid,
    pub title: String,
    pub options: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPoll {
    pub title: String,
    pub options: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl NewPoll {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), StoreError> {
        if self.title.trim().is_empty() {
            return Err(StoreError::invalid("poll title must not be blank"));
        }
        if self.options.len() < MIN_POLL_OPTIONS {
            return Err(StoreError::invalid(format!(
                "a poll needs at least {MIN_POLL_OPTIONS} options, got {}",
                self.options.len()
            )));
        }
        if let Some(pos) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(StoreError::invalid(format!("option {pos} must not be blank")));
        }
        if self.expires_at <= now {
            return Err(StoreError::invalid("expires_at must be in the future"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_index: i32,
    pub voter_ip: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVote {
    pub poll_id: Uuid,
    pub option_index: i32,
    pub voter_ip: String,
}

impl NewVote {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.voter_ip.trim().is_empty() {
            return Err(StoreError::invalid("voter_ip must not be blank"));
        }
        Ok(())
    }

    /// Bounds check against the poll's options.
    pub fn check_option(&self, options: &[String]) -> Result<(), StoreError> {
        let in_range = usize::try_from(self.option_index)
            .map(|i| i < options.len())
            .unwrap_or(false);
        if !in_range {
            return Err(StoreError::OptionOutOfRange {
                index: self.option_index,
                len: options.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coin {
    pub id: i32,
    pub symbol: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CoinVote {
    pub id: i32,
    pub coin_symbol: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CoinTally {
    pub symbol: String,
    pub votes: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollState {
    pub coins: Vec<Coin>,
    pub votes: HashMap<String, i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinSelection {
    pub symbols: Vec<String>,
}

impl CoinSelection {
    /// Trimmed, upper-cased, de-duplicated symbols in first-seen order.
    pub fn normalized(&self) -> Result<Vec<String>, StoreError> {
        if self.symbols.is_empty() {
            return Err(StoreError::invalid("at least one coin symbol is required"));
        }

        let mut out: Vec<String> = Vec::with_capacity(self.symbols.len());
        for raw in &self.symbols {
            let symbol = normalize_symbol(raw)?;
            if !out.contains(&symbol) {
                out.push(symbol);
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteRequest {
    pub coin_symbol: String,
    pub user_id: String,
}

impl VoteRequest {
    pub fn normalized(&self) -> Result<(String, String), StoreError> {
        let symbol = normalize_symbol(&self.coin_symbol)?;
        let user_id = self.user_id.trim();
        if user_id.is_empty() {
            return Err(StoreError::invalid("user_id must not be blank"));
        }
        Ok((symbol, user_id.to_string()))
    }
}

pub fn normalize_symbol(raw: &str) -> Result<String, StoreError> {
    let symbol = raw.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(StoreError::invalid("coin symbol must not be blank"));
    }
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StoreError::invalid(format!("invalid coin symbol: {raw}")));
    }
    Ok(symbol)
}
