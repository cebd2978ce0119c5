//! HTTP header construction for the stats API and the hosted datastore

use crate::Result;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

/// Headers for the stats API: JSON accept plus bearer token.
pub fn bearer_header_map(api_key: &str) -> Result<HeaderMap> {
    let mut h = HeaderMap::new();
    h.insert(ACCEPT, HeaderValue::from_static("application/json"));
    h.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {api_key}"))?);
    Ok(h)
}

/// Headers for the PostgREST endpoint, which wants the key twice.
pub fn datastore_header_map(service_key: &str) -> Result<HeaderMap> {
    let mut h = bearer_header_map(service_key)?;
    h.insert(HeaderName::from_static("apikey"), HeaderValue::from_str(service_key)?);
    h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(h)
}
