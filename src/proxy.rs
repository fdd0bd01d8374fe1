use std::future::Future;

use url::Url;

use crate::error::Error;
use crate::http::Method;
use crate::tokens::AccessToken;

/// The signing + transport seam: wraps one OAuth major version's rules for
/// attaching token credentials to an outbound request.
///
/// The service is generic over this trait and never branches on which
/// variant it holds. Like the transport trait, it uses `impl Future`
/// returns and is therefore not dyn-compatible.
pub trait ProtocolProxy: Send + Sync {
    /// The current access token, if one is stored.
    fn access_token(&self) -> Option<AccessToken>;

    /// Sign and send a request, returning the raw response body.
    ///
    /// `data` is the POST form payload (empty for GET). Provider error
    /// payloads come back as ordinary bodies regardless of HTTP status —
    /// classifying them is the response parser's job. Only transport
    /// failures error here.
    fn request(
        &self,
        url: &Url,
        method: Method,
        data: &[(String, String)],
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<String, Error>> + Send;
}
