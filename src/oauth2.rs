use std::sync::Arc;

use url::Url;

use crate::error::Error;
use crate::http::{HttpClient, HttpRequest, Method};
use crate::proxy::ProtocolProxy;
use crate::store::TokenStore;
use crate::tokens::AccessToken;

/// OAuth 2 proxy: signs requests by attaching the stored access token as
/// a bearer credential (RFC 6750).
pub struct OAuth2Proxy<C> {
    http: C,
    store: Arc<dyn TokenStore>,
}

impl<C: HttpClient> OAuth2Proxy<C> {
    pub fn new(http: C, store: Arc<dyn TokenStore>) -> Self {
        Self { http, store }
    }

    fn current_token(&self) -> Result<AccessToken, Error> {
        match self.store.load() {
            Some(token) if !token.is_expired() => Ok(token),
            _ => Err(Error::NotAuthenticated),
        }
    }
}

impl<C: HttpClient> ProtocolProxy for OAuth2Proxy<C> {
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

        let mut all_headers = vec![(
            "Authorization".to_string(),
            format!("Bearer {}", token.access_token()),
        )];
        // The signed credential owns this header; a caller-supplied
        // Authorization is discarded rather than sent twice.
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

        tracing::debug!(url = %url, method = method.as_str(), "sending bearer-signed request");

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
