mod error;
mod http;
mod oauth1;
mod oauth2;
mod proxy;
mod response;
mod service;
mod store;
mod tokens;

// Core
pub use error::Error;
pub use service::{AccessTokenData, OAuthService, RequestContext, RequestOptions};
pub use tokens::{AccessToken, EndOfLife};

// Collaborator seams
pub use http::{HttpClient, HttpRequest, HttpResponse, Method};
pub use proxy::ProtocolProxy;
pub use response::{JsonResponseParser, ResponseError, ResponseParser};
pub use store::{MemoryTokenStore, TokenStore};

// Protocol proxies (one per OAuth major version)
pub use oauth1::OAuth1Proxy;
pub use oauth2::OAuth2Proxy;

// Default HTTP client (behind feature flag)
#[cfg(feature = "reqwest-client")]
pub use http::{ReqwestClient, default_client};
