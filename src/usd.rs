//! Best-effort USD spot pricing.
//!
//! A failing rate source never aborts a purchase flow; callers degrade to an
//! unset USD figure.

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::Result;
use crate::http::HttpClient;
use crate::money::CurrencyId;

/// Spot-rate capability contract.
#[async_trait]
pub trait UsdRateSource: Send + Sync {
    /// USD per whole unit of `currency` on `network_id`.
    async fn rate(&self, network_id: u64, currency: CurrencyId) -> Result<f64>;
}

#[derive(Deserialize)]
struct RateResponse {
    usd: f64,
}

/// Rate source backed by an HTTP pricing service.
///
/// Queries `GET {base}/rates/{network}/{currency}` where `currency` is
/// `native` or a token address.
#[derive(Debug, Clone)]
pub struct HttpUsdSource {
    http: HttpClient,
}

impl HttpUsdSource {
    pub fn new(http: HttpClient) -> Self {
        HttpUsdSource { http }
    }
}

#[async_trait]
impl UsdRateSource for HttpUsdSource {
    async fn rate(&self, network_id: u64, currency: CurrencyId) -> Result<f64> {
        let path = format!("/rates/{network_id}/{currency}");
        let response: RateResponse = self.http.get_json(&path).await?;
        Ok(response.usd)
    }
}
