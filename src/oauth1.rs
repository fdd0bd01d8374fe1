use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::RngExt;
use sha1::Sha1;
use url::Url;

use crate::error::Error;
use crate::http::{HttpClient, HttpRequest, Method};
use crate::proxy::ProtocolProxy;
use crate::store::TokenStore;
use crate::tokens::AccessToken;

/// RFC 3986 unreserved characters pass through; everything else is
/// percent-encoded. This is stricter than form encoding (space is `%20`,
/// never `+`).
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn rfc3986_encode(input: &str) -> String {
    utf8_percent_encode(input, RFC3986).to_string()
}

/// The signature base string (RFC 5849 section 3.4.1): method, base URI
/// and the normalized parameters, each encoded and joined with `&`.
///
/// `params` holds *decoded* key/value pairs: the URL query, the request
/// body and the `oauth_*` protocol parameters (excluding the signature).
fn signature_base_string(method: Method, url: &Url, params: &[(String, String)]) -> String {
    let mut base_url = format!(
        "{}://{}",
        url.scheme(),
        url.host_str().unwrap_or_default()
    );
    if let Some(port) = url.port() {
        base_url.push_str(&format!(":{port}"));
    }
    base_url.push_str(url.path());

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (rfc3986_encode(k), rfc3986_encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.as_str(),
        rfc3986_encode(&base_url),
        rfc3986_encode(&normalized)
    )
}

/// HMAC-SHA1 over the base string, keyed with
/// `enc(consumer_secret)&enc(token_secret)`, base64-encoded.
fn hmac_sha1_signature(base: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key = format!(
        "{}&{}",
        rfc3986_encode(consumer_secret),
        rfc3986_encode(token_secret)
    );
    let mut mac =
        Hmac::<Sha1>::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(base.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

fn generate_nonce() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// OAuth 1.0a proxy: signs each request per RFC 5849 with HMAC-SHA1 and
/// carries the result in an `Authorization: OAuth` header.
///
/// The token secret is read from the stored token's extra parameters
/// under `oauth_token_secret`.
pub struct OAuth1Proxy<C> {
    http: C,
    store: Arc<dyn TokenStore>,
    consumer_key: String,
    consumer_secret: String,
}

impl<C: HttpClient> OAuth1Proxy<C> {
    pub fn new(
        http: C,
        store: Arc<dyn TokenStore>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            store,
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    fn current_token(&self) -> Result<AccessToken, Error> {
        match self.store.load() {
            Some(token) if !token.is_expired() => Ok(token),
            _ => Err(Error::NotAuthenticated),
        }
    }

    /// Build the `Authorization: OAuth ...` header value for a request.
    /// Nonce and timestamp are parameters so signing stays deterministic
    /// under test.
    fn authorization_header(
        &self,
        url: &Url,
        method: Method,
        data: &[(String, String)],
        token: &AccessToken,
        nonce: &str,
        timestamp: u64,
    ) -> String {
        let oauth_params = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            (
                "oauth_signature_method".to_string(),
                "HMAC-SHA1".to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_token".to_string(), token.access_token().to_string()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];

        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.extend_from_slice(data);
        params.extend_from_slice(&oauth_params);

        let base = signature_base_string(method, url, &params);
        let token_secret = token.extra_param("oauth_token_secret").unwrap_or_default();
        let signature = hmac_sha1_signature(&base, &self.consumer_secret, token_secret);

        let mut header_params = oauth_params;
        header_params.push(("oauth_signature".to_string(), signature));
        header_params.sort();

        let fields = header_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, rfc3986_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        format!("OAuth {fields}")
    }
}

impl<C: HttpClient> ProtocolProxy for OAuth1Proxy<C> {
    fn access_token(&self) -> Option<AccessToken> {
        self.store.load()
    }

    async fn request(
        &self,
        url: &Url,
        method: Method,
        data: &[(String, String)],
        headers: &[(String, String)],
    ) -> Result<String, Error> {
        let token = self.current_token()?;

        let authorization =
            self.authorization_header(url, method, data, &token, &generate_nonce(), unix_now());

        let mut all_headers = vec![("Authorization".to_string(), authorization)];
        // The signature owns this header; a caller-supplied Authorization
        // is discarded rather than sent twice.
        all_headers.extend(
            headers
                .iter()
                .filter(|(name, _)| !name.eq_ignore_ascii_case("authorization"))
                .cloned(),
        );

        let body = match method {
            Method::Post => {
                all_headers.push((
                    "Content-Type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                ));
                url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(data)
                    .finish()
                    .into_bytes()
            }
            Method::Get => Vec::new(),
        };

        tracing::debug!(url = %url, method = method.as_str(), "sending HMAC-SHA1 signed request");

        let response = self
            .http
            .send(HttpRequest {
                method,
                url: url.to_string(),
                headers: all_headers,
                body,
            })
            .await?;

        Ok(response.body_string())
    }
}
