use actix_web::http::StatusCode;
use serde_json::json;
use ultramsg_tools::UltraMsgApiError;

use super::{
    helpers::{notify_api, order_payload, post_request, sign},
    mocks::MockSender,
};

#[actix_web::test]
async fn valid_order_sends_exactly_one_image_message() {
    let _ = env_logger::try_init().ok();
    let mut sender = MockSender::new();
    sender
        .expect_send_image()
        .withf(|to, image, caption| {
            to == "+573001234567"
                && image == "https://cdn.example.com/pato.webp"
                && caption.contains("*1 x Pato Interactivo Led Musical*")
                && caption.contains("*50.000 COP*")
                && caption.contains("Calle 10 # 4-21, Medellín, Antioquia")
        })
        .times(1)
        .returning(|_, _, _| Ok(json!({"sent": true})));
    let api = notify_api(sender);
    let body = order_payload();
    let (status, response) = post_request(&api, "/webhook/order", &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);
}

#[actix_web::test]
async fn duplicate_order_is_acknowledged_without_a_second_dispatch() {
    let _ = env_logger::try_init().ok();
    let mut sender = MockSender::new();
    sender.expect_send_image().times(1).returning(|_, _, _| Ok(json!({"sent": true})));
    let api = notify_api(sender);
    let body = order_payload();
    let (status, _) = post_request(&api, "/webhook/order", &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    // Same event identifier, retried by the platform. The mock panics if it gets a second send.
    let (status, response) = post_request(&api, "/webhook/order", &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);
}

#[actix_web::test]
async fn phoneless_event_is_a_no_op_and_stays_unmarked() {
    let _ = env_logger::try_init().ok();
    let mut sender = MockSender::new();
    // The corrected resend below is the only dispatch allowed.
    sender.expect_send_image().times(1).returning(|_, _, _| Ok(json!({"sent": true})));
    let api = notify_api(sender);

    let mut event: serde_json::Value = serde_json::from_str(&order_payload()).unwrap();
    event["customer"]["phone"] = json!(null);
    event["shipping_address"]["phone"] = json!(null);
    let body = event.to_string();
    let (status, response) = post_request(&api, "/webhook/order", &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);

    // Shopify resends the same event id, now with a phone. It must not be blocked by the guard.
    let body = order_payload();
    let (status, _) = post_request(&api, "/webhook/order", &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn invalid_signature_is_rejected_before_any_processing() {
    let _ = env_logger::try_init().ok();
    let api = notify_api(MockSender::new());
    let body = order_payload();
    let (status, response) = post_request(&api, "/webhook/order", &body, Some("AAAAinvalidAAAA=")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(response.contains("error"));
}

#[actix_web::test]
async fn missing_signature_header_is_rejected() {
    let _ = env_logger::try_init().ok();
    let api = notify_api(MockSender::new());
    let body = order_payload();
    let (status, response) = post_request(&api, "/webhook/order", &body, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(response.contains("error"));
}

#[actix_web::test]
async fn empty_line_items_are_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let api = notify_api(MockSender::new());
    let mut event: serde_json::Value = serde_json::from_str(&order_payload()).unwrap();
    event["line_items"] = json!([]);
    let body = event.to_string();
    let (status, response) = post_request(&api, "/webhook/order", &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.contains("error"));
}

#[actix_web::test]
async fn missing_event_identifier_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let api = notify_api(MockSender::new());
    let mut event: serde_json::Value = serde_json::from_str(&order_payload()).unwrap();
    event.as_object_mut().unwrap().remove("id");
    let body = event.to_string();
    let (status, _) = post_request(&api, "/webhook/order", &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unparseable_body_is_an_internal_fault() {
    let _ = env_logger::try_init().ok();
    let api = notify_api(MockSender::new());
    let body = "this is not json";
    let (status, response) = post_request(&api, "/webhook/order", body, Some(&sign(body))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.contains("error"));
}

#[actix_web::test]
async fn abandoned_checkout_with_incomplete_address_omits_the_address_block() {
    let _ = env_logger::try_init().ok();
    let mut sender = MockSender::new();
    sender
        .expect_send_text()
        .withf(|to, body| to == "+573001234567" && !body.contains("datos de envío") && body.contains("*50.000 COP*"))
        .times(1)
        .returning(|_, _| Ok(json!({"sent": true})));
    let api = notify_api(sender);
    let mut event: serde_json::Value = serde_json::from_str(&order_payload()).unwrap();
    event["shipping_address"]["province"] = json!(null);
    let body = event.to_string();
    let (status, _) = post_request(&api, "/webhook/abandoned_checkout", &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn orders_and_checkouts_do_not_share_a_dedup_space() {
    let _ = env_logger::try_init().ok();
    let mut sender = MockSender::new();
    sender.expect_send_image().times(1).returning(|_, _, _| Ok(json!({"sent": true})));
    sender.expect_send_text().times(1).returning(|_, _| Ok(json!({"sent": true})));
    let api = notify_api(sender);
    let body = order_payload();
    let (status, _) = post_request(&api, "/webhook/order", &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    // Same numeric identifier arriving as a checkout event must still be dispatched.
    let (status, _) = post_request(&api, "/webhook/abandoned_checkout", &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn gateway_failure_is_swallowed_and_still_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut sender = MockSender::new();
    sender.expect_send_image().times(1).returning(|_, _, _| {
        Err(UltraMsgApiError::QueryError { status: 503, message: "instance offline".to_string() })
    });
    let api = notify_api(sender);
    let body = order_payload();
    let (status, response) = post_request(&api, "/webhook/order", &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);
}
