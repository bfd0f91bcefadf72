use std::{collections::BTreeMap, fmt::Display};

use log::*;
use serde::{Deserialize, Serialize};
use sfp_common::Money;

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
/// The `payment_status` vocabulary used by PayPal IPN messages. Values outside the documented set are kept verbatim
/// in [`PaymentStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
    Denied,
    Expired,
    Refunded,
    Reversed,
    Other(String),
}

impl From<&str> for PaymentStatus {
    fn from(value: &str) -> Self {
        match value.trim() {
            "Completed" => Self::Completed,
            "Pending" => Self::Pending,
            "Failed" => Self::Failed,
            "Denied" => Self::Denied,
            "Expired" => Self::Expired,
            "Refunded" => Self::Refunded,
            "Reversed" => Self::Reversed,
            s => Self::Other(s.to_string()),
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "Completed"),
            Self::Pending => write!(f, "Pending"),
            Self::Failed => write!(f, "Failed"),
            Self::Denied => write!(f, "Denied"),
            Self::Expired => write!(f, "Expired"),
            Self::Refunded => write!(f, "Refunded"),
            Self::Reversed => write!(f, "Reversed"),
            Self::Other(s) if s.is_empty() => write!(f, "(empty)"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

//--------------------------------------       IpnVerdict      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpnVerdict {
    Verified,
    Invalid,
    Other(String),
}

impl IpnVerdict {
    /// Only the exact body `VERIFIED` counts as verified. No trimming or case folding is applied.
    pub fn from_response(body: &str) -> Self {
        match body {
            "VERIFIED" => Self::Verified,
            "INVALID" => Self::Invalid,
            s => Self::Other(s.to_string()),
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl Display for IpnVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verified => write!(f, "VERIFIED"),
            Self::Invalid => write!(f, "INVALID"),
            Self::Other(s) => write!(f, "unexpected response '{s}'"),
        }
    }
}

//--------------------------------------       IpnPayload      ---------------------------------------------------------
/// The decoded body of an IPN message.
///
/// Every recognised field defaults to the empty string when PayPal leaves it out. Unrecognised fields are kept in
/// `extra` so that nothing is silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpnPayload {
    // Payment fields
    pub payment_status: String,
    pub txn_id: String,
    pub txn_type: String,
    pub receiver_email: String,
    pub receiver_id: String,
    pub business: String,
    pub mc_gross: String,
    pub mc_fee: String,
    pub mc_currency: String,
    pub payment_date: String,
    pub custom: String,
    pub invoice: String,
    pub item_name: String,
    pub item_number: String,
    // Payer fields
    pub payer_email: String,
    pub payer_id: String,
    pub payer_status: String,
    pub first_name: String,
    pub last_name: String,
    pub contact_phone: String,
    pub residence_country: String,
    // Shipping fields
    pub address_name: String,
    pub address_street: String,
    pub address_city: String,
    pub address_state: String,
    pub address_zip: String,
    pub address_country: String,
    pub address_country_code: String,
    pub address_status: String,
    pub extra: BTreeMap<String, String>,
}

impl IpnPayload {
    /// Decodes an `application/x-www-form-urlencoded` body. Decoding is lossy for invalid UTF-8 and never fails.
    /// If a key is repeated, the last value wins.
    pub fn from_form_bytes(body: &[u8]) -> Self {
        let mut payload = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            let value = value.into_owned();
            let field = match &*key {
                "payment_status" => &mut payload.payment_status,
                "txn_id" => &mut payload.txn_id,
                "txn_type" => &mut payload.txn_type,
                "receiver_email" => &mut payload.receiver_email,
                "receiver_id" => &mut payload.receiver_id,
                "business" => &mut payload.business,
                "mc_gross" => &mut payload.mc_gross,
                "mc_fee" => &mut payload.mc_fee,
                "mc_currency" => &mut payload.mc_currency,
                "payment_date" => &mut payload.payment_date,
                "custom" => &mut payload.custom,
                "invoice" => &mut payload.invoice,
                "item_name" => &mut payload.item_name,
                "item_number" => &mut payload.item_number,
                "payer_email" => &mut payload.payer_email,
                "payer_id" => &mut payload.payer_id,
                "payer_status" => &mut payload.payer_status,
                "first_name" => &mut payload.first_name,
                "last_name" => &mut payload.last_name,
                "contact_phone" => &mut payload.contact_phone,
                "residence_country" => &mut payload.residence_country,
                "address_name" => &mut payload.address_name,
                "address_street" => &mut payload.address_street,
                "address_city" => &mut payload.address_city,
                "address_state" => &mut payload.address_state,
                "address_zip" => &mut payload.address_zip,
                "address_country" => &mut payload.address_country,
                "address_country_code" => &mut payload.address_country_code,
                "address_status" => &mut payload.address_status,
                other => {
                    trace!("🅿️ Unrecognised IPN field '{other}' kept as extra data");
                    payload.extra.insert(other.to_string(), value);
                    continue;
                },
            };
            *field = value;
        }
        payload
    }

    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::from(self.payment_status.as_str())
    }

    /// The id linking this notification back to a local order: `custom`, or `invoice` if `custom` is empty.
    pub fn correlation_id(&self) -> Option<&str> {
        [self.custom.trim(), self.invoice.trim()].into_iter().find(|s| !s.is_empty())
    }

    pub fn gross_amount(&self) -> Option<Money> {
        if self.mc_gross.trim().is_empty() {
            return None;
        }
        self.mc_gross.parse::<Money>().map_err(|e| warn!("🅿️ Could not parse mc_gross. {e}")).ok()
    }

    /// Shipping country, preferring the full name over the country code.
    pub fn shipping_country(&self) -> &str {
        if self.address_country.trim().is_empty() {
            self.address_country_code.as_str()
        } else {
            self.address_country.as_str()
        }
    }

    pub fn payment_summary(&self) -> String {
        format!(
            "status: {}, txn_id: {}, txn_type: {}, receiver: {}, gross: {} {}, custom: {}, invoice: {}, item: {}",
            self.payment_status,
            self.txn_id,
            self.txn_type,
            self.receiver_email,
            self.mc_gross,
            self.mc_currency,
            self.custom,
            self.invoice,
            self.item_name
        )
    }

    pub fn payer_summary(&self) -> String {
        format!(
            "payer: {} ({}), name: {} {}, phone: {}, status: {}",
            self.payer_email, self.payer_id, self.first_name, self.last_name, self.contact_phone, self.payer_status
        )
    }

    pub fn shipping_summary(&self) -> String {
        format!(
            "name: {}, street: {}, city: {}, state: {}, zip: {}, country: {}, status: {}",
            self.address_name,
            self.address_street,
            self.address_city,
            self.address_state,
            self.address_zip,
            self.shipping_country(),
            self.address_status
        )
    }
}
