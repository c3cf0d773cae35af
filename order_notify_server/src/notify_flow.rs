//! The notification pipeline: verify → dedup-check → normalize → mark → format → dispatch.
//!
//! [`NotifyFlowApi`] owns the only mutable shared state in the process (the two delivery guards) together
//! with the store options and the gateway sender. Handlers call [`NotifyFlowApi::process`] to turn a raw
//! event into an outbound notification (or a no-op outcome), then hand the result to
//! [`NotifyFlowApi::dispatch`]. The split keeps the synchronous commit point (the dedup mark) strictly
//! before the first suspension point of the outbound send, and lets the route layer choose between inline
//! and deferred dispatch.

use std::fmt::Debug;

use log::*;
use thiserror::Error;
use ultramsg_tools::{UltraMsgApiError, WhatsAppSender};

use crate::{
    dedup::{DedupConfig, DeliveryGuard},
    messages::{build_abandoned_checkout_message, build_order_message},
    normalize::{normalize_event, NormalizeError},
    product_images::ProductImageMap,
    shopify_event::ShopifyEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Order,
    AbandonedCheckout,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::AbandonedCheckout => "abandoned checkout",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotifyOptions {
    pub store_name: String,
    pub country_code: String,
    pub product_images: ProductImageMap,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    /// The payload parsed as JSON but is not a processable event. Maps to HTTP 400.
    #[error("Invalid event. {0}")]
    InvalidEvent(String),
}

/// What happened to an event short of actually sending it.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The guard already holds this identifier; an upstream retry or a concurrent duplicate.
    AlreadyProcessed,
    /// Well-formed event, but no phone number anywhere. Not marked processed, so a corrected resend under
    /// the same identifier still gets a chance.
    NoPhone,
    /// Marked processed and ready to go out.
    Ready(OutboundNotification),
}

/// A fully rendered notification, decoupled from the event it came from.
#[derive(Debug, Clone)]
pub struct OutboundNotification {
    pub kind: EventKind,
    pub event_id: String,
    pub label: String,
    pub to: String,
    pub body: String,
    pub image: Option<String>,
}

pub struct NotifyFlowApi<S> {
    sender: S,
    options: NotifyOptions,
    // One guard per event category; order ids and checkout ids can collide numerically.
    order_guard: DeliveryGuard,
    checkout_guard: DeliveryGuard,
}

impl<S> Debug for NotifyFlowApi<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotifyFlowApi")
    }
}

impl<S> NotifyFlowApi<S> {
    pub fn new(sender: S, options: NotifyOptions, dedup: DedupConfig) -> Self {
        Self { sender, options, order_guard: DeliveryGuard::new(dedup), checkout_guard: DeliveryGuard::new(dedup) }
    }

    pub fn guard(&self, kind: EventKind) -> &DeliveryGuard {
        match kind {
            EventKind::Order => &self.order_guard,
            EventKind::AbandonedCheckout => &self.checkout_guard,
        }
    }

    /// Run an event through the pipeline up to (and including) the dedup mark.
    ///
    /// The mark via [`DeliveryGuard::mark_if_new`] is the commit point: it happens synchronously, with no
    /// suspension between the membership check and the insert, and strictly before any dispatch. If the
    /// outbound send later fails the event stays marked; a platform retry could only duplicate the message.
    pub fn process(&self, kind: EventKind, event: &ShopifyEvent) -> Result<ProcessOutcome, NotifyError> {
        let guard = self.guard(kind);
        let Some(event_id) = event.event_id() else {
            return Err(NotifyError::InvalidEvent("The event carries no identifier".to_string()));
        };
        if guard.is_processed(&event_id) {
            info!("🛍️️ Duplicate {} {}. A notification was already sent; ignoring.", kind.as_str(), event.display_label());
            return Ok(ProcessOutcome::AlreadyProcessed);
        }
        let record = match normalize_event(event, &self.options.country_code, &self.options.product_images) {
            Ok(record) => record,
            Err(e @ (NormalizeError::MissingEventId | NormalizeError::NoLineItems)) => {
                return Err(NotifyError::InvalidEvent(e.to_string()));
            },
            Err(NormalizeError::NoDeliverablePhone) => {
                info!(
                    "🛍️️ {} {} has no deliverable phone number. Nothing to send, not marking it processed.",
                    kind.as_str(),
                    event.display_label()
                );
                return Ok(ProcessOutcome::NoPhone);
            },
        };
        if !guard.mark_if_new(&record.event_id) {
            // A concurrent retry of the same event won the race between our check and this mark.
            info!("🛍️️ {} {} was marked by a concurrent request; ignoring.", kind.as_str(), record.label);
            return Ok(ProcessOutcome::AlreadyProcessed);
        }
        let (body, image) = match kind {
            EventKind::Order => (build_order_message(&record, &self.options.store_name), record.image.clone()),
            // Checkout reminders go out as text; the customer has not bought anything yet.
            EventKind::AbandonedCheckout => {
                (build_abandoned_checkout_message(&record, &self.options.store_name), None)
            },
        };
        debug!("🛍️️ {} {} normalized for {}; message is {} chars.", kind.as_str(), record.label, record.phone, body.len());
        Ok(ProcessOutcome::Ready(OutboundNotification {
            kind,
            event_id: record.event_id,
            label: record.label,
            to: record.phone,
            body,
            image,
        }))
    }
}

impl<S> NotifyFlowApi<S>
where S: WhatsAppSender
{
    /// Send a prepared notification through the gateway.
    ///
    /// This is the only suspension point in the pipeline. Failures are returned to the caller, which logs
    /// and swallows them at the receiver boundary; the event is already marked processed by then.
    pub async fn dispatch(&self, notification: &OutboundNotification) -> Result<(), UltraMsgApiError> {
        let result = match &notification.image {
            Some(image) => self.sender.send_image(&notification.to, image, &notification.body).await,
            None => self.sender.send_text(&notification.to, &notification.body).await,
        };
        match result {
            Ok(_) => {
                info!(
                    "🛍️️ Notification for {} {} delivered to {}.",
                    notification.kind.as_str(),
                    notification.label,
                    notification.to
                );
                Ok(())
            },
            Err(e) => {
                error!(
                    "🛍️️ Could not deliver the notification for {} {} to {}. {e}",
                    notification.kind.as_str(),
                    notification.label,
                    notification.to
                );
                Err(e)
            },
        }
    }

    /// Straight-through send for the manual smoke-test endpoint. Bypasses the guard and the normalizer on
    /// purpose; the caller supplies a ready-to-send recipient and body.
    pub async fn send_raw(
        &self,
        to: &str,
        message: &str,
        image: Option<&str>,
    ) -> Result<serde_json::Value, UltraMsgApiError> {
        match image {
            Some(image) => self.sender.send_image(to, image, message).await,
            None => self.sender.send_text(to, message).await,
        }
    }
}
