use std::env;

use log::*;
use notify_common::{helpers::parse_boolean_flag, Secret};
use ultramsg_tools::UltraMsgConfig;

use crate::{
    dedup::{DedupConfig, DEFAULT_EVICTION_BATCH, DEFAULT_MAX_ITEMS},
    product_images::ProductImageMap,
};

const DEFAULT_ONS_HOST: &str = "127.0.0.1";
const DEFAULT_ONS_PORT: u16 = 8480;
const DEFAULT_STORE_NAME: &str = "Mi Tienda";
const DEFAULT_COUNTRY_CODE: &str = "57";
const DEFAULT_DELAY_MINUTES: u64 = 2;
const MIN_DELAY_MINUTES: u64 = 1;
const MAX_DELAY_MINUTES: u64 = 3;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Store display name used in the message greeting.
    pub store_name: String,
    /// Country calling code prepended to national phone numbers. Configuration, never inferred.
    pub country_code: String,
    /// Minutes to wait before a deferred dispatch goes out, clamped to [1, 3]. Gives Shopify's own order
    /// state time to settle. Only honoured when `deferred_dispatch` is on.
    pub message_delay_minutes: u64,
    /// When true, webhook handlers acknowledge immediately and dispatch from a detached task after the
    /// configured delay. When false (the default), dispatch is awaited inline under the client timeout.
    pub deferred_dispatch: bool,
    /// Shared secret for verifying the `X-Shopify-Hmac-Sha256` webhook signature.
    pub hmac_secret: Secret<String>,
    /// Escape hatch for local testing; with checks disabled every webhook call is accepted as-is.
    pub hmac_checks: bool,
    pub dedup: DedupConfig,
    pub product_images: ProductImageMap,
    pub ultramsg: UltraMsgConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ONS_HOST.to_string(),
            port: DEFAULT_ONS_PORT,
            store_name: DEFAULT_STORE_NAME.to_string(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            message_delay_minutes: DEFAULT_DELAY_MINUTES,
            deferred_dispatch: false,
            hmac_secret: Secret::default(),
            hmac_checks: true,
            dedup: DedupConfig::default(),
            product_images: ProductImageMap::default(),
            ultramsg: UltraMsgConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("ONS_HOST").ok().unwrap_or_else(|| DEFAULT_ONS_HOST.into());
        let port = env::var("ONS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for ONS_PORT. {e} Using the default, {DEFAULT_ONS_PORT}, instead.");
                    DEFAULT_ONS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_ONS_PORT);
        let store_name = env::var("ONS_STORE_NAME").ok().unwrap_or_else(|| {
            warn!("🪛️ ONS_STORE_NAME is not set. Messages will greet customers from '{DEFAULT_STORE_NAME}'.");
            DEFAULT_STORE_NAME.into()
        });
        let country_code = env::var("ONS_COUNTRY_CODE").ok().unwrap_or_else(|| DEFAULT_COUNTRY_CODE.into());
        let hmac_secret = Secret::new(env::var("ONS_SHOPIFY_HMAC_SECRET").unwrap_or_else(|_| {
            error!("🪛️ ONS_SHOPIFY_HMAC_SECRET is not set. Every signed webhook call will be rejected.");
            String::default()
        }));
        let hmac_checks = parse_boolean_flag(env::var("ONS_SHOPIFY_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!("🚨️ Webhook HMAC checks are DISABLED. Anyone who can reach this server can trigger messages.");
        }
        let message_delay_minutes = configure_message_delay(env::var("ONS_MESSAGE_DELAY_MINUTES").ok());
        let deferred_dispatch = parse_boolean_flag(env::var("ONS_DEFERRED_DISPATCH").ok(), false);
        let dedup = configure_dedup();
        let product_images = match env::var("ONS_PRODUCT_IMAGES") {
            Ok(path) => ProductImageMap::from_file(&path),
            Err(_) => {
                info!("🪛️ ONS_PRODUCT_IMAGES is not set. Line-item images from the event will be used as-is.");
                ProductImageMap::default()
            },
        };
        let ultramsg = UltraMsgConfig::new_from_env_or_default();
        Self {
            host,
            port,
            store_name,
            country_code,
            message_delay_minutes,
            deferred_dispatch,
            hmac_secret,
            hmac_checks,
            dedup,
            product_images,
            ultramsg,
        }
    }
}

/// The slice of configuration the webhook handlers need at request time. Kept small and `Copy`, with no
/// secrets, so it can be dropped into the app data without ceremony.
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    /// Dispatch from a detached task after `delay` instead of awaiting the send inline.
    pub deferred: bool,
    pub delay: std::time::Duration,
}

impl DispatchOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            deferred: config.deferred_dispatch,
            delay: std::time::Duration::from_secs(config.message_delay_minutes * 60),
        }
    }

    /// Inline dispatch with no delay; what the endpoint tests run with.
    pub fn inline() -> Self {
        Self { deferred: false, delay: std::time::Duration::ZERO }
    }
}

/// Parses and clamps the delivery delay to [1, 3] minutes, defaulting to 2.
pub fn configure_message_delay(value: Option<String>) -> u64 {
    let minutes = match value {
        Some(s) => match s.parse::<u64>() {
            Ok(m) => m,
            Err(e) => {
                warn!("🪛️ Invalid value for ONS_MESSAGE_DELAY_MINUTES ({s}). {e}. Using {DEFAULT_DELAY_MINUTES}.");
                DEFAULT_DELAY_MINUTES
            },
        },
        None => DEFAULT_DELAY_MINUTES,
    };
    minutes.clamp(MIN_DELAY_MINUTES, MAX_DELAY_MINUTES)
}

fn configure_dedup() -> DedupConfig {
    let max_items = env::var("ONS_DEDUP_MAX_ITEMS")
        .ok()
        .and_then(|s| {
            s.parse::<usize>().map_err(|e| warn!("🪛️ Invalid value for ONS_DEDUP_MAX_ITEMS. {e}")).ok()
        })
        .unwrap_or(DEFAULT_MAX_ITEMS);
    let eviction_batch = env::var("ONS_DEDUP_EVICTION_BATCH")
        .ok()
        .and_then(|s| {
            s.parse::<usize>().map_err(|e| warn!("🪛️ Invalid value for ONS_DEDUP_EVICTION_BATCH. {e}")).ok()
        })
        .unwrap_or(DEFAULT_EVICTION_BATCH);
    DedupConfig { max_items, eviction_batch }
}
