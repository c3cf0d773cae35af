use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use ultramsg_tools::UltraMsgApi;

use crate::{
    config::{DispatchOptions, ServerConfig},
    errors::ServerError,
    middleware::HmacMiddlewareFactory,
    notify_flow::{NotifyFlowApi, NotifyOptions},
    routes::{health, AbandonedCheckoutWebhookRoute, OrderWebhookRoute, SendMessageRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let sender = UltraMsgApi::new(config.ultramsg.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, sender)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, sender: UltraMsgApi) -> Result<Server, ServerError> {
    // The flow API (and with it the two delivery guards) is constructed once here, outside the worker
    // factory closure. Workers share it through `Data`; a per-worker guard would let duplicates through.
    let options = NotifyOptions {
        store_name: config.store_name.clone(),
        country_code: config.country_code.clone(),
        product_images: config.product_images.clone(),
    };
    let api = web::Data::new(NotifyFlowApi::new(sender, options, config.dedup));
    let dispatch_options = web::Data::new(DispatchOptions::from_config(&config));
    if config.deferred_dispatch {
        info!(
            "🪛️ Deferred dispatch is on. Notifications go out {} minute(s) after the webhook is acknowledged.",
            config.message_delay_minutes
        );
    }
    let hmac_secret = config.hmac_secret.clone();
    let hmac_checks = config.hmac_checks;
    let srv = HttpServer::new(move || {
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(hmac_secret.clone(), hmac_checks))
            .service(OrderWebhookRoute::<UltraMsgApi>::new())
            .service(AbandonedCheckoutWebhookRoute::<UltraMsgApi>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ons::access_log"))
            .app_data(api.clone())
            .app_data(dispatch_options.clone())
            .service(health)
            .service(SendMessageRoute::<UltraMsgApi>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
