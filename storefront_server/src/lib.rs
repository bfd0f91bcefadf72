//! # Storefront payments server
//! This crate hosts the HTTP server for storefront payments. It is responsible for:
//! * Listening for PayPal Instant Payment Notifications (IPN), verifying them with PayPal and reconciling the reported
//!   payment status onto the stored order.
//! * Serving the admin order status API (listing, status changes, deletion).
//! * Sending an order confirmation email when an order is marked as paid.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/paypal/ipn`: The PayPal IPN listener. Always acknowledges with `200 OK`.
//! * `GET /api/paypal/ipn`: Diagnostics for the IPN listener configuration.
//! * `GET|PATCH|DELETE /api/orders`: The admin order status API.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
