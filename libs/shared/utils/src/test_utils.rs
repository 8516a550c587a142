//! Helpers for exercising the auth layer in tests: mints HMAC-SHA256 JWTs
//! that `jwt::validate_token` accepts.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub fn sign_test_token(user_id: Uuid, role: &str, secret: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS256", "typ": "JWT"}).to_string());
    let exp = chrono::Utc::now().timestamp() as u64 + 3600;
    let claims = URL_SAFE_NO_PAD.encode(
        json!({
            "sub": user_id.to_string(),
            "role": role,
            "exp": exp,
            "iat": exp - 3600,
        })
        .to_string(),
    );

    let payload = format!("{}.{}", header, claims);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{}.{}", payload, signature)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
