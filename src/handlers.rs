// src/handlers.rs
use axum::{
    extract::{FromRequest, State},
    Json,
};
use serde_json::{json, Value};

use crate::coins::{CoinStore, TOP_COINS};
use crate::error::AppError;
use crate::models::{Coin, CoinSelection, CoinTally, PollState, VoteRequest};

/// JSON body extractor whose rejections use the API error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Clone)]
pub struct AppState {
    pub coins: CoinStore,
}

impl AppState {
    pub fn new(coins: CoinStore) -> Self {
        Self { coins }
    }
}

/// Fetch all selected coins
pub async fn get_coins(State(state): State<AppState>) -> Result<Json<Vec<Coin>>, AppError> {
    Ok(Json(state.coins.list_coins().await?))
}

/// Replace the coins on the poll (admin)
pub async fn select_coins(
    State(state): State<AppState>,
    AppJson(selection): AppJson<CoinSelection>,
) -> Result<Json<Value>, AppError> {
    let coins = state.coins.select_coins(&selection).await?;
    Ok(Json(json!({
        "status": "Coins selected successfully",
        "coins": coins,
    })))
}

/// Get the current poll state
pub async fn get_poll(State(state): State<AppState>) -> Result<Json<PollState>, AppError> {
    Ok(Json(state.coins.poll_state().await?))
}

/// Most voted coins
pub async fn get_top(State(state): State<AppState>) -> Result<Json<Vec<CoinTally>>, AppError> {
    Ok(Json(state.coins.top_coins(TOP_COINS).await?))
}

/// Vote for a coin
pub async fn vote(
    State(state): State<AppState>,
    AppJson(request): AppJson<VoteRequest>,
) -> Result<Json<Value>, AppError> {
    state.coins.cast_vote(&request).await.map_err(|e| {
        if e.is_unique_violation() {
            AppError::AlreadyVoted
        } else {
            AppError::from(e)
        }
    })?;

    Ok(Json(json!({ "status": "Vote recorded" })))
}
