use axum::http::HeaderMap;
use headers::authorization::Bearer;
use headers::{Authorization, HeaderMapExt};
use rand::distr::{Alphanumeric, SampleString};
use rand::rng;
use sha2::{Digest, Sha256};

pub fn generate_api_key() -> String {
  format!("playstat-sk-{}", Alphanumeric.sample_string(&mut rng(), 32))
}

/// Hash of an API key or web user token, as stored in the database.
pub fn hash_api_key(key: &str) -> String {
  format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// Token of an `Authorization: Bearer` header, if there is one.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
  headers
    .typed_get::<Authorization<Bearer>>()
    .map(|auth| auth.token().to_string())
}
