use std::{env, net::IpAddr};

use log::*;
use paypal_tools::PayPalConfig;
use sfp_common::{helpers::parse_boolean_flag, Secret};

const DEFAULT_SFP_HOST: &str = "127.0.0.1";
const DEFAULT_SFP_PORT: u16 = 8360;
const DEFAULT_STORE_NAME: &str = "Storefront";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    pub paypal: PayPalConfig,
    /// If supplied, requests against /api/paypal endpoints will be checked against a whitelist of IP addresses.
    /// To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub paypal_whitelist: Option<Vec<IpAddr>>,
    pub email: EmailConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SFP_HOST.to_string(),
            port: DEFAULT_SFP_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            paypal: PayPalConfig::default(),
            paypal_whitelist: None,
            email: EmailConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SFP_HOST").ok().unwrap_or_else(|| DEFAULT_SFP_HOST.into());
        let port = env::var("SFP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SFP_PORT. {e} Using the default, {DEFAULT_SFP_PORT}, instead."
                    );
                    DEFAULT_SFP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SFP_PORT);
        let database_url = env::var("SFP_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SFP_DATABASE_URL is not set. The default database location will be used.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("SFP_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SFP_USE_FORWARDED").ok(), false);
        let paypal = PayPalConfig::new_from_env_or_default();
        let paypal_whitelist = parse_whitelist(env::var("PAYPAL_IPN_IP_WHITELIST").ok());
        let email = EmailConfig::from_env_or_default();
        Self { host, port, database_url, use_x_forwarded_for, use_forwarded, paypal, paypal_whitelist, email }
    }
}

/// Parses a comma separated IP list. `none`, `false` and `0` switch the whitelist off, as does leaving it unset.
pub fn parse_whitelist(value: Option<String>) -> Option<Vec<IpAddr>> {
    let whitelist = value.and_then(|s| {
        if ["none", "false", "0", ""].contains(&s.trim().to_lowercase().as_str()) {
            info!(
                "🪛️ PayPal IP whitelist is disabled. If this is not what you want, set PAYPAL_IPN_IP_WHITELIST to a \
                 comma-separated list of IP addresses to enable it."
            );
            return None;
        }
        let ip_addrs = s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| {
                s.parse::<IpAddr>()
                    .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in PAYPAL_IPN_IP_WHITELIST: {e}"))
                    .ok()
            })
            .collect::<Vec<IpAddr>>();
        Some(ip_addrs)
    });
    match &whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The PayPal IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 IPN messages."
            );
        },
        None => {
            info!("🪛️ No PayPal IP whitelist is set. IPN messages are authenticated by PayPal verification only.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ PayPal IP whitelist: {addrs}");
        },
    }
    whitelist
}

//-------------------------------------------------  EmailConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct EmailConfig {
    /// Endpoint of the transactional email API. Confirmation emails are not sent if this is not set.
    pub api_url: Option<String>,
    pub api_key: Secret<String>,
    pub from: String,
    pub store_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: Secret::default(),
            from: String::default(),
            store_name: DEFAULT_STORE_NAME.to_string(),
        }
    }
}

impl EmailConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env::var("SFP_EMAIL_API_URL").ok().filter(|s| !s.trim().is_empty());
        if api_url.is_none() {
            warn!("🪛️ SFP_EMAIL_API_URL is not set. Order confirmation emails will not be sent.");
        }
        let api_key = env::var("SFP_EMAIL_API_KEY").ok().unwrap_or_else(|| {
            if api_url.is_some() {
                warn!("🪛️ SFP_EMAIL_API_KEY is not set. The email API will probably reject our requests.");
            }
            String::default()
        });
        let from = env::var("SFP_EMAIL_FROM").ok().unwrap_or_else(|| {
            if api_url.is_some() {
                error!("🪛️ SFP_EMAIL_FROM is not set. Please set it to the sender address for confirmation emails.");
            }
            String::default()
        });
        let store_name = env::var("SFP_STORE_NAME").ok().unwrap_or_else(|| DEFAULT_STORE_NAME.to_string());
        Self { api_url, api_key: Secret::new(api_key), from, store_name }
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub paypal_whitelist: Option<Vec<IpAddr>>,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            paypal_whitelist: config.paypal_whitelist.clone(),
        }
    }
}
