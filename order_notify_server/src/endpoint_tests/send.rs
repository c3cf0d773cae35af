use actix_web::http::StatusCode;
use serde_json::json;
use ultramsg_tools::UltraMsgApiError;

use super::{
    helpers::{notify_api, post_request},
    mocks::MockSender,
};

#[actix_web::test]
async fn manual_text_send_goes_straight_to_the_gateway() {
    let _ = env_logger::try_init().ok();
    let mut sender = MockSender::new();
    sender
        .expect_send_text()
        .withf(|to, body| to == "+573001234567" && body == "smoke test")
        .times(1)
        .returning(|_, _| Ok(json!({"sent": true})));
    let api = notify_api(sender);
    let body = json!({"to": "+573001234567", "message": "smoke test"}).to_string();
    let (status, response) = post_request(&api, "/send", &body, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains(r#""success":true"#));
}

#[actix_web::test]
async fn manual_image_send_uses_the_message_as_caption() {
    let _ = env_logger::try_init().ok();
    let mut sender = MockSender::new();
    sender
        .expect_send_image()
        .withf(|to, image, caption| {
            to == "+573001234567" && image == "https://cdn.example.com/promo.webp" && caption == "smoke test"
        })
        .times(1)
        .returning(|_, _, _| Ok(json!({"sent": true})));
    let api = notify_api(sender);
    let body = json!({
        "to": "+573001234567",
        "message": "smoke test",
        "image": "https://cdn.example.com/promo.webp"
    })
    .to_string();
    let (status, _) = post_request(&api, "/send", &body, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn blank_recipient_or_message_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let api = notify_api(MockSender::new());
    let body = json!({"to": "  ", "message": "hello"}).to_string();
    let (status, response) = post_request(&api, "/send", &body, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.contains("error"));
}

#[actix_web::test]
async fn gateway_rejection_surfaces_as_a_server_error() {
    let _ = env_logger::try_init().ok();
    let mut sender = MockSender::new();
    sender.expect_send_text().times(1).returning(|_, _| {
        Err(UltraMsgApiError::QueryError { status: 401, message: "bad token".to_string() })
    });
    let api = notify_api(sender);
    let body = json!({"to": "+573001234567", "message": "smoke test"}).to_string();
    let (status, response) = post_request(&api, "/send", &body, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.contains("error"));
}
