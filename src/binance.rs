// src/binance.rs
use std::time::Duration;

use reqwest::{Client, Error};
use serde::Deserialize;

const TICKER_PATH: &str = "/api/v3/ticker/price";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CryptoPrice {
    pub symbol: String,
    pub price: String,
}

/// Client for the public Binance ticker endpoint.
#[derive(Debug, Clone)]
pub struct BinanceClient {
    http: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let http = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn ticker_url(&self) -> String {
        format!("{}{}", self.base_url, TICKER_PATH)
    }

    pub async fn fetch_crypto_prices(&self) -> Result<Vec<CryptoPrice>, Error> {
        let prices = self
            .http
            .get(self.ticker_url())
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<CryptoPrice>>()
            .await?;
        Ok(prices)
    }
}
