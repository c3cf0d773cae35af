use actix_web::{
    body::to_bytes,
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web,
    App,
};
use notify_common::Secret;

use super::mocks::MockSender;
use crate::{
    config::DispatchOptions,
    dedup::DedupConfig,
    helpers::calculate_hmac,
    middleware::{HmacMiddlewareFactory, SHOPIFY_HMAC_HEADER},
    notify_flow::{NotifyFlowApi, NotifyOptions},
    product_images::ProductImageMap,
    routes::{AbandonedCheckoutWebhookRoute, OrderWebhookRoute, SendMessageRoute},
};

// Shared secret for signing test webhook bodies. DO NOT re-use anywhere.
pub const TEST_SECRET: &str = "test-webhook-secret";

pub fn sign(body: &str) -> String {
    calculate_hmac(TEST_SECRET, body.as_bytes())
}

/// A flow API around the given mock, with dedup guards at their default capacity. Tests keep the returned
/// `Data` handle so repeated requests hit the same guards, exactly like retries against a live server.
pub fn notify_api(sender: MockSender) -> web::Data<NotifyFlowApi<MockSender>> {
    let options = NotifyOptions {
        store_name: "Wendys Outlet".to_string(),
        country_code: "57".to_string(),
        product_images: ProductImageMap::default(),
    };
    web::Data::new(NotifyFlowApi::new(sender, options, DedupConfig::default()))
}

/// POSTs `body` to `path` against an app wired the same way as the real server: `/webhook/*` behind the
/// HMAC middleware, `/send` in the open. Returns the response status and body, for error responses too.
pub async fn post_request(
    api: &web::Data<NotifyFlowApi<MockSender>>,
    path: &str,
    body: &str,
    signature: Option<&str>,
) -> (StatusCode, String) {
    let webhook_scope = web::scope("/webhook")
        .wrap(HmacMiddlewareFactory::new(Secret::new(TEST_SECRET.to_string()), true))
        .service(OrderWebhookRoute::<MockSender>::new())
        .service(AbandonedCheckoutWebhookRoute::<MockSender>::new());
    let app = App::new()
        .app_data(api.clone())
        .app_data(web::Data::new(DispatchOptions::inline()))
        .service(SendMessageRoute::<MockSender>::new())
        .service(webhook_scope);
    let service = test::init_service(app).await;
    let mut req = TestRequest::post().uri(path).insert_header(ContentType::json()).set_payload(body.to_string());
    if let Some(signature) = signature {
        req = req.insert_header((SHOPIFY_HMAC_HEADER, signature));
    }
    match test::try_call_service(&service, req.to_request()).await {
        Ok(response) => {
            let (_, response) = response.into_parts();
            let status = response.status();
            let bytes = to_bytes(response.into_body()).await.expect("could not read response body");
            (status, String::from_utf8_lossy(&bytes).into_owned())
        },
        Err(e) => {
            let response = e.as_response_error().error_response();
            let status = response.status();
            let bytes = to_bytes(response.into_body()).await.expect("could not read error body");
            (status, String::from_utf8_lossy(&bytes).into_owned())
        },
    }
}

/// A complete, valid new-order payload: one line item with an image, a customer phone and a full address.
pub fn order_payload() -> String {
    serde_json::json!({
        "id": 820982911946154508u64,
        "name": "#9999",
        "email": "jon@example.com",
        "phone": null,
        "total_price": "50000.00",
        "currency": "COP",
        "line_items": [
            {
                "title": "Pato Interactivo Led Musical",
                "quantity": 1,
                "price": "50000.00",
                "sku": "PATO-01",
                "image": "https://cdn.example.com/pato.webp"
            }
        ],
        "shipping_address": {
            "first_name": "Wendy",
            "address1": "Calle 10 # 4-21",
            "city": "Medellín",
            "province": "Antioquia",
            "country": "Colombia",
            "zip": "050001",
            "phone": null
        },
        "customer": {
            "first_name": "Wendy",
            "last_name": "Prueba",
            "phone": "300 123 4567"
        }
    })
    .to_string()
}
