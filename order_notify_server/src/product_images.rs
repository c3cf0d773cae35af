//! Per-deployment product image overrides.
//!
//! Stores often want a curated marketing image in the WhatsApp message rather than whatever thumbnail
//! Shopify attaches to the line item. The map is keyed by SKU or by exact product title and loaded once at
//! startup from a JSON file.

use std::collections::HashMap;

use log::*;

#[derive(Debug, Clone, Default)]
pub struct ProductImageMap {
    map: HashMap<String, String>,
}

impl ProductImageMap {
    pub fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    /// Load the overrides from a JSON object of `sku-or-title → image URL`. A missing or malformed file is
    /// logged and treated as "no overrides"; it must never stop the server from starting.
    pub fn from_file(path: &str) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("🪛️ Could not read the product image map at {path}. {e}. No overrides will be applied.");
                return Self::default();
            },
        };
        match serde_json::from_str::<HashMap<String, String>>(&raw) {
            Ok(map) => {
                info!("🪛️ Loaded {} product image override(s) from {path}.", map.len());
                Self { map }
            },
            Err(e) => {
                warn!("🪛️ The product image map at {path} is not a JSON object of strings. {e}. Ignoring it.");
                Self::default()
            },
        }
    }

    /// Resolve the image to attach for a product: override by SKU first, then by exact title, then whatever
    /// image the event itself carried. `None` means the notification goes out as text only.
    pub fn resolve(&self, title: &str, sku: Option<&str>, event_image: Option<&str>) -> Option<String> {
        if let Some(url) = sku.and_then(|s| self.map.get(s)) {
            return Some(url.clone());
        }
        if let Some(url) = self.map.get(title) {
            return Some(url.clone());
        }
        event_image.map(|url| url.to_string())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
