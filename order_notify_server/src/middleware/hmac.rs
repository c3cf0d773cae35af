//! HMAC signature middleware for the webhook scope.
//!
//! Shopify signs every webhook delivery with base64(HMAC-SHA256(shared secret, raw body)) in the
//! `X-Shopify-Hmac-Sha256` header. The middleware recomputes the signature over the raw bytes, rejects the
//! request with a 401 on a mismatch, and replays the consumed body into the request payload so the handler
//! can still deserialize it.
//!
//! A request without the header is rejected outright when checks are enabled. Treating a missing header as
//! "trusted" would let any unsigned caller trigger customer messages; the only sanctioned way to skip
//! verification is the explicit `enabled = false` switch used for local testing.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use log::{trace, warn};
use notify_common::Secret;

use crate::{
    errors::{ServerError, SignatureError},
    helpers::calculate_hmac,
};

pub const SHOPIFY_HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";

pub struct HmacMiddlewareFactory {
    secret: Secret<String>,
    // If false, the middleware does not check signatures and always allows the call.
    enabled: bool,
}

impl HmacMiddlewareFactory {
    pub fn new(secret: Secret<String>, enabled: bool) -> Self {
        HmacMiddlewareFactory { secret, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService { secret: self.secret.clone(), enabled: self.enabled, service: Rc::new(service) }))
    }
}

pub struct HmacMiddlewareService<S> {
    secret: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = futures::future::LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.reveal().clone();
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking the webhook signature");
            if !enabled {
                trace!("🔐️ Signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            let body = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to read the request body for signature verification: {e:?}");
                ServerError::InvalidRequestBody("Could not read the request body.".to_string())
            })?;
            let signature = req.headers().get(SHOPIFY_HMAC_HEADER).ok_or_else(|| {
                warn!("🔐️ No {SHOPIFY_HMAC_HEADER} header in the request. Denying access.");
                ServerError::from(SignatureError::MissingSignature)
            })?;
            let expected = calculate_hmac(&secret, body.as_ref());
            if signature == expected.as_str() {
                trace!("🔐️ Webhook signature check ✅️");
                req.set_payload(bytes_to_payload(body));
                service.call(req).await
            } else {
                warn!("🔐️ Invalid webhook signature. Denying access.");
                Err(ServerError::from(SignatureError::InvalidSignature).into())
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
