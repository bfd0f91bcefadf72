//! Order confirmation emails.
//!
//! Confirmations are sent through a transactional email HTTP API when an order moves into `paid`. Sending happens on
//! the event handler task, so a slow or failing email provider never holds up the status change that triggered it.
use std::sync::Arc;

use futures::future::BoxFuture;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::Serialize;
use storefront_engine::events::{EventHandlers, EventHooks, OrderPaidEvent};
use thiserror::Error;

use crate::config::EmailConfig;

pub const EMAIL_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Could not initialize the email client: {0}")]
    Initialization(String),
    #[error("Could not send the email request: {0}")]
    RequestError(String),
    #[error("The email provider returned an error. Status {status}. {message}")]
    ProviderError { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Clone)]
pub struct EmailClient {
    api_url: String,
    from: String,
    store_name: String,
    client: Arc<Client>,
}

impl EmailClient {
    /// Returns `Ok(None)` when no email API is configured.
    pub fn new(config: &EmailConfig) -> Result<Option<Self>, EmailError> {
        let Some(api_url) = config.api_url.clone() else {
            return Ok(None);
        };
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !config.api_key.reveal().is_empty() {
            let mut val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
                .map_err(|e| EmailError::Initialization(e.to_string()))?;
            val.set_sensitive(true);
            headers.insert(AUTHORIZATION, val);
        }
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| EmailError::Initialization(e.to_string()))?;
        Ok(Some(Self {
            api_url,
            from: config.from.clone(),
            store_name: config.store_name.clone(),
            client: Arc::new(client),
        }))
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        trace!("📧️ Sending email '{}' to {}", message.subject, message.to);
        let response = self
            .client
            .post(&self.api_url)
            .json(message)
            .send()
            .await
            .map_err(|e| EmailError::RequestError(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_else(|e| format!("(no body: {e})"));
            Err(EmailError::ProviderError { status: status.as_u16(), message })
        }
    }

    pub async fn send_order_confirmation(&self, event: &OrderPaidEvent) -> Result<(), EmailError> {
        let message = confirmation_message(event, &self.from, &self.store_name);
        self.send(&message).await
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Builds the confirmation email for a paid order. The recipient is the shipping email.
pub fn confirmation_message(event: &OrderPaidEvent, from: &str, store_name: &str) -> EmailMessage {
    let order = &event.order;
    EmailMessage {
        from: from.to_string(),
        to: order.shipping_address.email.trim().to_string(),
        subject: format!("{store_name}: payment confirmed for order #{}", order.order_number),
        html: render_confirmation(event, store_name),
    }
}

pub fn render_confirmation(event: &OrderPaidEvent, store_name: &str) -> String {
    let order = &event.order;
    let address = &order.shipping_address;
    let rows = event
        .lines
        .iter()
        .map(|line| {
            let sku = line.sku.as_deref().map(|s| format!(" ({})", escape_html(s))).unwrap_or_default();
            format!(
                "<tr><td>{}{sku}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&line.name),
                line.quantity,
                line.price,
                line.line_total()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let discount = if order.discount.value() > 0 {
        let code = order.coupon_code.as_deref().map(|c| format!(" ({})", escape_html(c))).unwrap_or_default();
        format!("<p>Discount{code}: -{} {}</p>\n", order.discount, escape_html(&order.currency))
    } else {
        String::new()
    };
    let address_lines = [
        address.full_name(),
        address.address1.clone(),
        address.address2.clone(),
        [address.city.as_str(), address.state.as_str(), address.zip.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        address.country.clone(),
        address.phone.clone(),
    ]
    .iter()
    .filter(|s| !s.trim().is_empty())
    .map(|s| escape_html(s))
    .collect::<Vec<_>>()
    .join("<br/>\n");
    format!(
        "<h1>{store}</h1>\n<p>Thank you for your order! Your payment has been confirmed.</p>\n<h2>Order \
         #{number}</h2>\n<table>\n<tr><th>Item</th><th>Qty</th><th>Price</th><th>Total</th></tr>\n{rows}\n</table>\n\
         {discount}<p><strong>Total: {total} {currency}</strong></p>\n<h3>Shipping to</h3>\n<p>{address_lines}</p>\n",
        store = escape_html(store_name),
        number = escape_html(&order.order_number),
        total = order.total,
        currency = escape_html(&order.currency),
    )
}

/// Subscribes the email client to order paid events.
///
/// Failures are logged. They never affect the order, which is already stored as paid by the time the event arrives.
pub fn create_email_event_handlers(client: EmailClient) -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(move |ev| {
        if ev.order.shipping_address.email.trim().is_empty() {
            warn!(
                "📧️ Order {} is paid, but has no shipping email address. No confirmation will be sent.",
                ev.order.id
            );
            return no_op();
        }
        let client = client.clone();
        Box::pin(async move {
            let order_id = ev.order.id.clone();
            match client.send_order_confirmation(&ev).await {
                Ok(()) => info!("📧️ Order confirmation for {order_id} sent"),
                Err(e) => error!("📧️ Could not send the order confirmation for {order_id}. {e}"),
            }
        })
    });
    EventHandlers::new(EMAIL_EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
