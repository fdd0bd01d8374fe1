use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::error::Error;
use crate::http::Method;
use crate::proxy::ProtocolProxy;
use crate::response::{JsonResponseParser, ResponseParser};
use crate::store::TokenStore;
use crate::tokens::EndOfLife;

/// Per-call request options for a signed request.
///
/// Non-empty `data` implies POST semantics: the presence of request data
/// selects the HTTP method, the caller never states it explicitly.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub data: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The inbound-request view needed to reconstruct the OAuth callback URL.
/// Injected by the surrounding web layer.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Scheme + host, e.g. `https://app.example.com`.
    pub host_info: String,
    /// Mount point of the application, e.g. `/app` or empty.
    pub base_url: String,
    /// Path info of the current request, without a leading slash.
    pub path_info: String,
}

impl RequestContext {
    pub fn new(
        host_info: impl Into<String>,
        base_url: impl Into<String>,
        path_info: impl Into<String>,
    ) -> Self {
        Self {
            host_info: host_info.into(),
            base_url: base_url.into(),
            path_info: path_info.into(),
        }
    }
}

/// Read-only snapshot of the current token. The field names are a
/// compatibility surface for callers persisting or forwarding token state
/// and must stay exactly as they are.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessTokenData {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// End-of-life timestamp, or `-9` (unknown) / `-1` (never).
    pub expires: i64,
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// The OAuth client service: authentication-state checks, target URL
/// construction, delegation to the protocol proxy, response parsing and
/// error normalization behind one contract.
///
/// Generic over the proxy (OAuth 1 or 2); the token store and response
/// parser are injected, with sensible defaults for the latter.
pub struct OAuthService<P> {
    proxy: P,
    store: Arc<dyn TokenStore>,
    parser: Box<dyn ResponseParser>,
    base_api_url: String,
    token_default_lifetime: EndOfLife,
}

impl<P: ProtocolProxy> OAuthService<P> {
    pub fn new(proxy: P, store: Arc<dyn TokenStore>, base_api_url: impl Into<String>) -> Self {
        Self {
            proxy,
            store,
            parser: Box::new(JsonResponseParser),
            base_api_url: base_api_url.into(),
            token_default_lifetime: EndOfLife::Unknown,
        }
    }

    /// Replace the response parser (provider-specific formats and error
    /// envelopes).
    pub fn with_parser(mut self, parser: impl ResponseParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Default lifetime applied by token-issuing logic when the provider
    /// omits an explicit expiry.
    pub fn with_token_default_lifetime(mut self, lifetime: EndOfLife) -> Self {
        self.token_default_lifetime = lifetime;
        self
    }

    /// True iff the store holds a token for this provider that has not
    /// passed its end of life. An unknown end of life counts as valid
    /// until explicitly invalidated.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.store.load(), Some(token) if !token.is_expired())
    }

    /// Deterministic reconstruction of the current request's full URL,
    /// used as the OAuth redirect target. Pure function of the inbound
    /// request context.
    pub fn callback_url(&self, context: &RequestContext) -> String {
        format!(
            "{}{}/{}",
            context.host_info, context.base_url, context.path_info
        )
    }

    /// Request a protected resource and parse the response.
    ///
    /// `url` is prefixed with the configured base API URL unless it
    /// already carries a scheme. Query pairs from `options` are appended
    /// to the target; non-empty `options.data` turns the request into a
    /// POST. The raw body is run through the response parser and error
    /// detector before being returned.
    pub async fn make_signed_request(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, Error> {
        let raw = self.send_signed(url, options).await?;
        self.parse_response_internal(&raw)
    }

    /// Same as [`make_signed_request`](Self::make_signed_request) but
    /// returns the raw response body unmodified, skipping parsing and
    /// error detection.
    pub async fn make_raw_signed_request(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<String, Error> {
        self.send_signed(url, options).await
    }

    /// `None` when unauthenticated, otherwise a snapshot of the current
    /// token. Never mutates the token.
    pub fn access_token_data(&self) -> Option<AccessTokenData> {
        if !self.is_authenticated() {
            return None;
        }

        let token = self.proxy.access_token()?;
        Some(AccessTokenData {
            access_token: token.access_token().to_string(),
            refresh_token: token.refresh_token().map(String::from),
            expires: token.end_of_life().as_timestamp(),
            params: token.extra_params().clone(),
        })
    }

    pub fn token_default_lifetime(&self) -> EndOfLife {
        self.token_default_lifetime
    }

    pub fn base_api_url(&self) -> &str {
        &self.base_api_url
    }

    async fn send_signed(&self, url: &str, options: &RequestOptions) -> Result<String, Error> {
        if !self.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }

        let target = self.resolve_url(url);
        let mut target = Url::parse(&target).map_err(|_| Error::InvalidUrl { url: target })?;

        for (key, value) in &options.query {
            target.query_pairs_mut().append_pair(key, value);
        }

        let method = if options.data.is_empty() {
            Method::Get
        } else {
            Method::Post
        };

        tracing::debug!(target = %target, method = method.as_str(), "signed request");

        self.proxy
            .request(&target, method, &options.data, &options.headers)
            .await
    }

    /// A target without a scheme is relative to the base API URL; one
    /// already starting with `http` (case-insensitive) is used verbatim.
    fn resolve_url(&self, url: &str) -> String {
        let has_scheme = url
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http"));
        if has_scheme {
            url.to_string()
        } else {
            format!("{}{}", self.base_api_url, url)
        }
    }

    fn parse_response_internal(&self, raw: &str) -> Result<serde_json::Value, Error> {
        let parsed = self
            .parser
            .parse_response(raw)
            .ok_or(Error::InvalidResponseFormat)?;

        if let Some(error) = self.parser.fetch_response_error(&parsed) {
            if !error.message.is_empty() {
                return Err(Error::Provider {
                    code: error.code,
                    message: error.message,
                });
            }
        }

        Ok(parsed)
    }
}
