use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT},
    Client,
};

use crate::{config::PayPalConfig, helpers::notify_validate_body, IpnVerdict, PayPalApiError};

/// Confirms with PayPal that an IPN message really came from PayPal.
#[allow(async_fn_in_trait)]
pub trait IpnVerification {
    /// Echo the raw IPN body back to PayPal and return the verdict.
    async fn verify(&self, raw_body: &[u8]) -> Result<IpnVerdict, PayPalApiError>;
}

#[derive(Clone)]
pub struct IpnVerifier {
    config: PayPalConfig,
    client: Arc<Client>,
}

impl IpnVerifier {
    pub fn new(config: PayPalConfig) -> Result<Self, PayPalApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        headers.insert(USER_AGENT, HeaderValue::from_static("storefront-ipn-listener"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PayPalApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PayPalConfig {
        &self.config
    }
}

impl IpnVerification for IpnVerifier {
    async fn verify(&self, raw_body: &[u8]) -> Result<IpnVerdict, PayPalApiError> {
        let url = self.config.ipn_verify_url();
        trace!("🅿️ Sending IPN validation request to {url}");
        let response = self
            .client
            .post(url)
            .body(notify_validate_body(raw_body))
            .send()
            .await
            .map_err(|e| PayPalApiError::RequestError(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| PayPalApiError::ResponseError(e.to_string()))?;
        if !status.is_success() {
            return Err(PayPalApiError::QueryError { status: status.as_u16(), message: text });
        }
        let verdict = IpnVerdict::from_response(&text);
        debug!("🅿️ IPN validation result: {verdict}");
        Ok(verdict)
    }
}
