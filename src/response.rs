/// A provider-reported error extracted from a structured response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseError {
    pub code: u16,
    pub message: String,
}

/// Turns a raw response body into a structured value and detects
/// provider-reported errors inside it.
///
/// Providers with non-JSON bodies or their own error envelopes supply
/// their own implementation; the service only ever talks to this trait.
pub trait ResponseParser: Send + Sync {
    /// Decode the raw body. `None` means the input is malformed for this
    /// provider's format.
    fn parse_response(&self, raw: &str) -> Option<serde_json::Value>;

    /// Inspect a decoded value for a provider-specific error marker.
    /// `None` means the response is a success.
    fn fetch_response_error(&self, response: &serde_json::Value) -> Option<ResponseError>;
}

/// Default parser: JSON bodies, with any `"error"` key treated as a flat
/// failure. The error detection here is a fallback — real providers
/// extract their own codes and messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonResponseParser;

impl ResponseParser for JsonResponseParser {
    fn parse_response(&self, raw: &str) -> Option<serde_json::Value> {
        serde_json::from_str(raw).ok()
    }

    fn fetch_response_error(&self, response: &serde_json::Value) -> Option<ResponseError> {
        response.get("error").map(|_| ResponseError {
            code: 500,
            message: "Unknown error occurred.".to_string(),
        })
    }
}
