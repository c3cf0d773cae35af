//! Serde model for the Shopify webhook payloads the notifier consumes.
//!
//! New-order and abandoned-checkout callbacks carry the same fields for our purposes, so one event type
//! serves both routes. Shopify omits fields freely between API versions, and webhook handlers must never
//! 500 over an absent optional field, so everything except the line items defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShopifyEvent {
    /// The event identifier (order id or checkout id). Used as the dedup key.
    pub id: Option<i64>,
    /// The display name of the order, e.g. "#1001". Checkouts usually have no name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub total_price: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub customer: Option<Customer>,
}

impl ShopifyEvent {
    /// The dedup key for this event, as an opaque string.
    pub fn event_id(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }

    /// Human-readable label for log lines: the order name when present, otherwise the raw id.
    pub fn display_label(&self) -> String {
        match (&self.name, self.id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => "<unidentified>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LineItem {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Address {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Customer {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}
