use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the signature Shopify puts in the `X-Shopify-Hmac-Sha256` header: base64(HMAC-SHA256(secret,
/// raw body)). The comparison against the header happens in the HMAC middleware.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(data);
    base64::encode(mac.finalize().into_bytes())
}
