//! HMAC-SHA256 request signing shared by the REST adapters.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str, payload: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    mac
}

/// Hex-encoded HMAC-SHA256, the Binance signature shape.
pub fn sign_hex(secret: &str, payload: &str) -> String {
    hex::encode(mac(secret, payload).finalize().into_bytes())
}

/// Base64-encoded HMAC-SHA256, the KuCoin signature shape.
pub fn sign_base64(secret: &str, payload: &str) -> String {
    BASE64.encode(mac(secret, payload).finalize().into_bytes())
}
