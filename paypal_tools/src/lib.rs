//! # PayPal tools
//!
//! Types and a small client for PayPal's Instant Payment Notification (IPN) protocol.
//!
//! * [`IpnPayload`] is the typed form of the `application/x-www-form-urlencoded` body PayPal posts to the listener.
//! * [`IpnVerifier`] posts the raw body back to PayPal's validation endpoint and reports the [`IpnVerdict`].
//! * [`PayPalConfig`] selects the sandbox or live endpoints and holds the expected receiver (business) address.
mod api;
mod config;
pub mod data_objects;
mod error;
pub mod helpers;

pub use api::{IpnVerification, IpnVerifier};
pub use config::{PayPalConfig, PayPalMode, LIVE_IPN_URL, SANDBOX_IPN_URL};
pub use data_objects::{IpnPayload, IpnVerdict, PaymentStatus};
pub use error::PayPalApiError;
