use std::{env, fmt::Display, time::Duration};

use log::*;

pub const SANDBOX_IPN_URL: &str = "https://ipnpb.sandbox.paypal.com/cgi-bin/webscr";
pub const LIVE_IPN_URL: &str = "https://ipnpb.paypal.com/cgi-bin/webscr";
const DEFAULT_IPN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayPalMode {
    #[default]
    Sandbox,
    Live,
}

impl PayPalMode {
    /// `live` (case-insensitive) selects the live environment. Everything else, including an unset value, is sandbox.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|s| s.trim().to_lowercase()) {
            Some(s) if s == "live" => Self::Live,
            _ => Self::Sandbox,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Live => "live",
        }
    }
}

impl Display for PayPalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub mode: PayPalMode,
    /// The receiver address that every IPN must be addressed to. An empty value matches nothing.
    pub business_email: String,
    /// Overrides the validation endpoint implied by `mode`. Useful for local testing against a stub.
    pub verify_url: Option<String>,
    pub timeout: Duration,
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self::new(PayPalMode::default(), "")
    }
}

impl PayPalConfig {
    pub fn new(mode: PayPalMode, business_email: &str) -> Self {
        Self { mode, business_email: business_email.to_string(), verify_url: None, timeout: DEFAULT_IPN_TIMEOUT }
    }

    pub fn new_from_env_or_default() -> Self {
        let mode = PayPalMode::from_env_value(env::var("PAYPAL_MODE").ok().as_deref());
        info!("🅿️ PayPal is running in {mode} mode");
        let business_email = env::var("PAYPAL_BUSINESS_EMAIL")
            .or_else(|_| env::var("NEXT_PUBLIC_PAYPAL_BUSINESS_EMAIL"))
            .unwrap_or_else(|_| {
                warn!(
                    "🅿️ PAYPAL_BUSINESS_EMAIL is not set. Every IPN message will fail the receiver check until it is \
                     configured."
                );
                String::default()
            });
        let verify_url = env::var("PAYPAL_IPN_VERIFY_URL").ok().filter(|s| !s.trim().is_empty());
        if let Some(url) = &verify_url {
            warn!("🅿️ IPN messages will be verified against {url} instead of the {mode} endpoint");
        }
        let timeout = env::var("PAYPAL_IPN_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🅿️ Invalid value for PAYPAL_IPN_TIMEOUT_SECS ({s}). {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_IPN_TIMEOUT);
        Self { mode, business_email, verify_url, timeout }
    }

    pub fn ipn_verify_url(&self) -> &str {
        match (&self.verify_url, self.mode) {
            (Some(url), _) => url.as_str(),
            (None, PayPalMode::Live) => LIVE_IPN_URL,
            (None, PayPalMode::Sandbox) => SANDBOX_IPN_URL,
        }
    }

    /// Trimmed, case-insensitive comparison of the configured business address with the IPN `receiver_email`.
    pub fn is_expected_receiver(&self, receiver_email: &str) -> bool {
        let expected = self.business_email.trim();
        !expected.is_empty() && expected.eq_ignore_ascii_case(receiver_email.trim())
    }
}
