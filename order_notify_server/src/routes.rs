//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Webhook handlers must answer Shopify within its 60-second deadline, and anything other than a 2xx makes
//! the platform retry the whole delivery. That is why every outcome past signature verification and payload
//! validation, including a gateway failure, is acknowledged with a 200: the event is already marked in the
//! delivery guard by then, and a platform retry could only produce a duplicate customer message.

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use ultramsg_tools::WhatsAppSender;

use crate::{
    config::DispatchOptions,
    data_objects::{JsonResponse, SendMessageRequest, WebhookAck},
    errors::ServerError,
    notify_flow::{EventKind, NotifyError, NotifyFlowApi, ProcessOutcome},
    shopify_event::ShopifyEvent,
};

// Web-actix cannot handle generics in handlers, so handler registration is implemented manually using the
// `route!` macro.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Webhooks  ----------------------------------------------------

route!(order_webhook => Post "/order" impl WhatsAppSender);
/// Webhook endpoint for Shopify's `orders/create` topic.
pub async fn order_webhook<S>(
    body: web::Bytes,
    api: web::Data<NotifyFlowApi<S>>,
    options: web::Data<DispatchOptions>,
) -> Result<HttpResponse, ServerError>
where
    S: WhatsAppSender + 'static,
{
    handle_webhook(EventKind::Order, body, api, **options).await
}

route!(abandoned_checkout_webhook => Post "/abandoned_checkout" impl WhatsAppSender);
/// Webhook endpoint for Shopify's `checkouts/update` topic (abandoned checkout reminders).
pub async fn abandoned_checkout_webhook<S>(
    body: web::Bytes,
    api: web::Data<NotifyFlowApi<S>>,
    options: web::Data<DispatchOptions>,
) -> Result<HttpResponse, ServerError>
where
    S: WhatsAppSender + 'static,
{
    handle_webhook(EventKind::AbandonedCheckout, body, api, **options).await
}

async fn handle_webhook<S>(
    kind: EventKind,
    body: web::Bytes,
    api: web::Data<NotifyFlowApi<S>>,
    options: DispatchOptions,
) -> Result<HttpResponse, ServerError>
where
    S: WhatsAppSender + 'static,
{
    // The body was already signature-checked by the middleware; a parse failure here is an internal fault,
    // reported as a 500 so the platform retries the delivery. Nothing has been marked at this point.
    let event: ShopifyEvent =
        serde_json::from_slice(&body).map_err(|e| ServerError::CouldNotDeserializePayload(e.to_string()))?;
    trace!("🛍️️ Received {} webhook for {}", kind.as_str(), event.display_label());
    let outcome = match api.process(kind, &event) {
        Ok(outcome) => outcome,
        Err(NotifyError::InvalidEvent(reason)) => {
            warn!("🛍️️ Rejecting {} webhook: {reason}", kind.as_str());
            return Err(ServerError::InvalidEvent(reason));
        },
    };
    match outcome {
        ProcessOutcome::AlreadyProcessed | ProcessOutcome::NoPhone => {},
        ProcessOutcome::Ready(notification) => {
            if options.deferred {
                // Detached dispatch: acknowledge now, send after the configured settling delay. The event
                // is already marked, so a platform retry in the meantime is short-circuited.
                debug!(
                    "🛍️️ Deferring dispatch for {} {} by {:?}.",
                    kind.as_str(),
                    notification.label,
                    options.delay
                );
                let api = api.clone();
                actix_web::rt::spawn(async move {
                    tokio::time::sleep(options.delay).await;
                    // Failures are logged by dispatch; there is nothing left to do with them here.
                    let _ = api.dispatch(&notification).await;
                });
            } else if let Err(e) = api.dispatch(&notification).await {
                // Swallowed: a non-2xx would make Shopify retry an event we already marked processed.
                warn!("🛍️️ Delivery failed for {} {}; acknowledging anyway. {e}", kind.as_str(), notification.label);
            }
        },
    }
    Ok(HttpResponse::Ok().json(WebhookAck::received()))
}

//----------------------------------------------   Manual send  ----------------------------------------------------

route!(send_message => Post "/send" impl WhatsAppSender);
/// Operational smoke-test endpoint. Sends directly through the gateway, bypassing the delivery guard and
/// the normalizer. Not part of the webhook flow.
pub async fn send_message<S>(
    body: web::Json<SendMessageRequest>,
    api: web::Data<NotifyFlowApi<S>>,
) -> Result<HttpResponse, ServerError>
where
    S: WhatsAppSender + 'static,
{
    let request = body.into_inner();
    if request.to.trim().is_empty() || request.message.trim().is_empty() {
        return Err(ServerError::InvalidRequestBody("Both 'to' and 'message' are required.".to_string()));
    }
    debug!("📤️ Manual send request for {}", request.to);
    match api.send_raw(&request.to, &request.message, request.image.as_deref()).await {
        Ok(_) => Ok(HttpResponse::Ok().json(JsonResponse::success("Message dispatched to the gateway."))),
        Err(e) => Err(ServerError::DeliveryFailed(e.to_string())),
    }
}
