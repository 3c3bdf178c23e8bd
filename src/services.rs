// src/services.rs
use std::collections::HashMap;

use tracing::{info, warn};

use crate::binance::{BinanceClient, CryptoPrice};
use crate::coins::CoinStore;
use crate::error::AppError;
use crate::models::Coin;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub updated: usize,
    pub missing: Vec<String>,
}

/// Pair each selected coin with its ticker price.
///
/// Returns `(symbol, price)` updates and the symbols the ticker lacked.
pub fn match_prices(coins: &[Coin], prices: &[CryptoPrice]) -> (Vec<(String, String)>, Vec<String>) {
    let by_symbol: HashMap<&str, &str> = prices
        .iter()
        .map(|p| (p.symbol.as_str(), p.price.as_str()))
        .collect();

    let mut updates = Vec::new();
    let mut missing = Vec::new();
    for coin in coins {
        match by_symbol.get(coin.symbol.as_str()) {
            Some(price) => updates.push((coin.symbol.clone(), price.to_string())),
            None => missing.push(coin.symbol.clone()),
        }
    }
    (updates, missing)
}

/// Fetch current prices and write them onto the selected coins.
pub async fn refresh_coin_prices(
    store: &CoinStore,
    client: &BinanceClient,
) -> Result<RefreshReport, AppError> {
    let coins = store.list_coins().await?;
    if coins.is_empty() {
        info!("no coins selected, skipping price refresh");
        return Ok(RefreshReport::default());
    }

    let prices = client.fetch_crypto_prices().await?;
    let (updates, missing) = match_prices(&coins, &prices);

    let mut updated = 0;
    for (symbol, price) in &updates {
        if store.update_price(symbol, price).await? {
            updated += 1;
        }
    }

    if !missing.is_empty() {
        warn!(missing = ?missing, "ticker had no price for some coins");
    }
    info!(updated, fetched = prices.len(), "coin prices refreshed");

    Ok(RefreshReport { updated, missing })
}
