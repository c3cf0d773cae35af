//! Turns a raw Shopify event into a canonical, transport-agnostic notification record.
//!
//! All of the resolution rules live here: which of the several phone fields wins, how the phone is brought
//! into international format, how the shipping address is flattened into one line, and which image (if any)
//! gets attached. The record that comes out is immutable and consumed exactly once by the formatter.

use notify_common::format_price;
use thiserror::Error;

use crate::{
    product_images::ProductImageMap,
    shopify_event::{Address, ShopifyEvent},
};

/// Greeting name used when the event carries no usable first name anywhere.
pub const FALLBACK_CUSTOMER_NAME: &str = "Cliente";
/// Sentinel used when no address fields are present at all.
pub const ADDRESS_NOT_SPECIFIED: &str = "No especificada";

#[derive(Debug, Clone)]
pub struct ProductLine {
    pub name: String,
    pub quantity: u32,
}

/// Canonical notification record: everything the formatter needs, resolved and validated. Built once,
/// never mutated.
#[derive(Debug, Clone)]
pub struct NotificationRecord {
    /// Opaque dedup key (order id or checkout id).
    pub event_id: String,
    /// Human-readable event label for logs, e.g. "#1001".
    pub label: String,
    pub customer_name: String,
    /// Recipient phone in international format (`+57…`).
    pub phone: String,
    pub products: Vec<ProductLine>,
    /// Total already formatted for display ("50.000").
    pub total: String,
    pub currency: String,
    /// Flattened address line, or [`ADDRESS_NOT_SPECIFIED`].
    pub shipping_address: String,
    /// True when address1, city and province are all present. Gates the address block in
    /// abandoned-checkout messages; order messages always include the address line.
    pub address_complete: bool,
    /// Image to attach, resolved from the override map or the event itself. `None` means text-only.
    pub image: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// Structurally invalid: there is nothing to deduplicate on.
    #[error("The event carries no identifier")]
    MissingEventId,
    /// Structurally invalid: an order or checkout with nothing in it.
    #[error("The event has no line items")]
    NoLineItems,
    /// Not an error in the HTTP sense: the event is well-formed but there is nobody to message.
    #[error("No deliverable phone number found in the event")]
    NoDeliverablePhone,
}

pub fn normalize_event(
    event: &ShopifyEvent,
    country_code: &str,
    images: &ProductImageMap,
) -> Result<NotificationRecord, NormalizeError> {
    let event_id = event.event_id().ok_or(NormalizeError::MissingEventId)?;
    if event.line_items.is_empty() {
        return Err(NormalizeError::NoLineItems);
    }
    let phone = resolve_phone(event, country_code).ok_or(NormalizeError::NoDeliverablePhone)?;
    let customer_name = resolve_customer_name(event);
    let products = event
        .line_items
        .iter()
        .map(|item| ProductLine { name: item.title.clone(), quantity: item.quantity })
        .collect::<Vec<_>>();
    // The first line item decides the attached image, as in the storefront's own order confirmation.
    let first = &event.line_items[0];
    let image = images.resolve(&first.title, first.sku.as_deref(), first.image.as_deref());
    let address = event.shipping_address.as_ref().or(event.billing_address.as_ref());
    let shipping_address = join_address(address);
    let address_complete = address.map(is_address_complete).unwrap_or(false);
    Ok(NotificationRecord {
        event_id,
        label: event.display_label(),
        customer_name,
        phone,
        products,
        total: format_price(&event.total_price),
        currency: event.currency.clone(),
        shipping_address,
        address_complete,
        image,
    })
}

fn resolve_customer_name(event: &ShopifyEvent) -> String {
    event
        .customer
        .as_ref()
        .and_then(|c| non_empty(c.first_name.as_deref()))
        .or_else(|| event.shipping_address.as_ref().and_then(|a| non_empty(a.first_name.as_deref())))
        .or_else(|| event.billing_address.as_ref().and_then(|a| non_empty(a.first_name.as_deref())))
        .unwrap_or_else(|| FALLBACK_CUSTOMER_NAME.to_string())
}

fn resolve_phone(event: &ShopifyEvent, country_code: &str) -> Option<String> {
    let raw = event
        .customer
        .as_ref()
        .and_then(|c| non_empty(c.phone.as_deref()))
        .or_else(|| event.shipping_address.as_ref().and_then(|a| non_empty(a.phone.as_deref())))
        .or_else(|| event.billing_address.as_ref().and_then(|a| non_empty(a.phone.as_deref())))
        .or_else(|| non_empty(event.phone.as_deref()));
    normalize_phone(raw.as_deref(), country_code)
}

/// Brings a phone number into international format for the configured country.
///
/// Whitespace, hyphens and parentheses are stripped. A number already carrying the country prefix keeps it
/// (gaining a `+` if it lacked one); anything else gets `+<country_code>` prepended. The country code is
/// configuration, never inferred from the number.
pub fn normalize_phone(phone: Option<&str>, country_code: &str) -> Option<String> {
    let phone = phone?;
    let cleaned: String = phone.chars().filter(|c| !matches!(c, ' ' | '\t' | '-' | '(' | ')')).collect();
    if cleaned.is_empty() {
        return None;
    }
    let with_plus = format!("+{country_code}");
    if cleaned.starts_with(&with_plus) {
        Some(cleaned)
    } else if cleaned.starts_with(country_code) {
        Some(format!("+{cleaned}"))
    } else {
        Some(format!("+{country_code}{cleaned}"))
    }
}

/// Joins the non-empty parts of {address1, address2, city, province} with ", ". Country and zip are
/// deliberately left out of the display line.
pub fn join_address(address: Option<&Address>) -> String {
    let Some(address) = address else {
        return ADDRESS_NOT_SPECIFIED.to_string();
    };
    let parts = [&address.address1, &address.address2, &address.city, &address.province]
        .into_iter()
        .filter_map(|f| non_empty(f.as_deref()))
        .collect::<Vec<_>>();
    if parts.is_empty() {
        ADDRESS_NOT_SPECIFIED.to_string()
    } else {
        parts.join(", ")
    }
}

/// The stricter gate used for abandoned-checkout messages: a usable address needs at least a street line,
/// a city and a province.
pub fn is_address_complete(address: &Address) -> bool {
    [&address.address1, &address.city, &address.province].into_iter().all(|f| non_empty(f.as_deref()).is_some())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
