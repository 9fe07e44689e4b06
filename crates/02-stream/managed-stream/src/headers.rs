use http::header::{CACHE_CONTROL, CONNECTION, CONTENT_ENCODING, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue};

pub const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Response headers for a long-lived chunked stream: keep the connection
/// open, disable caching and proxy buffering, and forbid re-encoding.
pub fn stream_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(5);
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-transform"),
    );
    headers.insert(X_ACCEL_BUFFERING, HeaderValue::from_static("no"));
    headers.insert(CONTENT_ENCODING, HeaderValue::from_static("none"));
    headers
}
