//! # Order notify server
//! This module hosts the server code for the Shopify → WhatsApp order notifier. It is responsible for:
//! Listening for incoming webhook requests from Shopify (new orders and abandoned checkouts).
//! Verifying the webhook signature and deduplicating retried deliveries.
//! Normalizing the event payload and rendering the WhatsApp message.
//! Dispatching the message through the UltraMsg gateway.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/order`: The webhook route for new-order events from Shopify.
//! * `/webhook/abandoned_checkout`: The webhook route for abandoned-checkout events from Shopify.
//! * `/send`: A manual smoke-test route that sends a message straight through the gateway.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod dedup;
pub mod errors;
pub mod helpers;
pub mod messages;
pub mod middleware;
pub mod normalize;
pub mod notify_flow;
pub mod product_images;
pub mod routes;
pub mod server;
pub mod shopify_event;

#[cfg(test)]
mod endpoint_tests;
