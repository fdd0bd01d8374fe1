use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// A mock resource API built on `wiremock`. Simulates a provider's
/// protected endpoints with configurable bodies.
pub struct MockApiServer {
    server: MockServer,
}

impl MockApiServer {
    /// Start a new mock server on a random available port.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mock server (e.g. "http://127.0.0.1:PORT").
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Mount a handler that returns HTTP 200 with the given JSON body.
    pub async fn mock_json(&self, http_method: &str, at: &str, body: serde_json::Value) {
        Mock::given(method(http_method))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&self.server)
            .await;
    }

    /// Mount a handler that returns an arbitrary raw body and status.
    pub async fn mock_raw(&self, http_method: &str, at: &str, status: u16, body: &str) {
        Mock::given(method(http_method))
            .and(path(at))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// All requests the server has received so far.
    pub async fn received(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}

/// Decode a form-urlencoded request body into key/value pairs.
pub fn parse_form_body(request: &Request) -> Vec<(String, String)> {
    url::form_urlencoded::parse(&request.body)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// A named header value from a recorded request.
pub fn get_header(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
