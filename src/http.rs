//! Shared HTTP transport helper.
//!
//! Providers describe one exchange (method, headers, body, query) and get back
//! a normalized [`ApiResponse`]: non-success statuses become failures with a
//! best-effort message pulled from the body, network-level errors become
//! failures carrying the transport cause, and unexpected-but-2xx statuses are
//! logged and treated as success.

use crate::{ApiResponse, Error};
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Description of a single HTTP exchange.
#[derive(Debug)]
pub(crate) struct RequestOptions {
    method: Method,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
    query: Vec<(String, String)>,
    expected: Vec<u16>,
}

impl RequestOptions {
    pub(crate) fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: None,
            query: Vec::new(),
            expected: vec![200],
        }
    }

    pub(crate) fn get() -> Self {
        Self::new(Method::GET)
    }

    pub(crate) fn post() -> Self {
        Self::new(Method::POST)
    }

    pub(crate) fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Add a header. Invalid values are silently skipped; provider-supplied
    /// headers are static strings in practice.
    pub(crate) fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub(crate) fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Override the status codes considered expected (default: 200 only).
    pub(crate) fn expect_status(mut self, statuses: &[u16]) -> Self {
        self.expected = statuses.to_vec();
        self
    }
}

/// Execute one exchange and normalize the outcome.
///
/// `T = ()` works for bodyless responses (204 deserializes from null).
pub(crate) async fn send<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    options: RequestOptions,
) -> ApiResponse<T> {
    let mut request = http.request(options.method.clone(), url);

    if !options.query.is_empty() {
        request = request.query(&options.query);
    }

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if options.body.is_some()
        || options.method == Method::POST
        || options.method == Method::PUT
        || options.method == Method::PATCH
    {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    // Caller headers win over the defaults.
    for (name, value) in options.headers.iter() {
        headers.insert(name, value.clone());
    }
    request = request.headers(headers);

    if let Some(body) = &options.body {
        request = request.json(body);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            return ApiResponse::failure_with(
                format!("Network or client error: {err}"),
                Error::Request(err),
            );
        }
    };

    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(err) => {
            return ApiResponse::failure_with(
                format!("Network or client error: {err}"),
                Error::Request(err),
            );
        }
    };

    let body_value = if status == StatusCode::NO_CONTENT || text.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text.clone()))
    };

    if !status.is_success() {
        let message = extract_error_message(&body_value, &text, status);
        return ApiResponse::failure_with_status(
            status.as_u16(),
            format!("API Error: {message}"),
            Some(Error::Api {
                status: status.as_u16(),
                body: text,
            }),
        );
    }

    if !options.expected.contains(&status.as_u16()) {
        warn!(
            status = status.as_u16(),
            expected = ?options.expected,
            method = %options.method,
            url,
            "received unexpected success status"
        );
    }

    match serde_json::from_value::<T>(body_value) {
        Ok(data) => ApiResponse::success_with_status(status.as_u16(), data),
        Err(err) => ApiResponse::failure_with_status(
            status.as_u16(),
            format!("Unexpected response shape: {err}"),
            Some(Error::Json(err)),
        ),
    }
}

/// Best-effort extraction of a human-readable message from an error body:
/// `message`, `detail`, or `error` keys, else the raw body text, else the
/// status line.
fn extract_error_message(body: &serde_json::Value, text: &str, status: StatusCode) -> String {
    if let Some(object) = body.as_object() {
        for key in ["message", "detail", "error"] {
            if let Some(value) = object.get(key).and_then(|v| v.as_str()) {
                return value.to_string();
            }
        }
    }
    if !text.trim().is_empty() {
        return text.trim().to_string();
    }
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::{DELETE, GET, POST};
    use httpmock::MockServer;
    use serde_json::json;

    #[tokio::test]
    async fn extracts_message_key_from_error_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/fail");
            then.status(422).json_body(json!({ "message": "address taken" }));
        });

        let http = reqwest::Client::new();
        let response: ApiResponse<serde_json::Value> =
            send(&http, &server.url("/fail"), RequestOptions::get()).await;

        assert_eq!(response.status(), Some(422));
        assert_eq!(response.message(), Some("API Error: address taken"));
        match response.error() {
            Some(Error::Api { status, body }) => {
                assert_eq!(*status, 422);
                assert!(body.contains("address taken"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        mock.assert();
    }

    #[tokio::test]
    async fn falls_back_to_detail_then_raw_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/detail");
            then.status(401).json_body(json!({ "detail": "bad token" }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/raw");
            then.status(500).body("upstream exploded");
        });

        let http = reqwest::Client::new();

        let detail: ApiResponse<serde_json::Value> =
            send(&http, &server.url("/detail"), RequestOptions::get()).await;
        assert_eq!(detail.message(), Some("API Error: bad token"));

        let raw: ApiResponse<serde_json::Value> =
            send(&http, &server.url("/raw"), RequestOptions::get()).await;
        assert_eq!(raw.message(), Some("API Error: upstream exploded"));
    }

    #[tokio::test]
    async fn extracts_error_key_from_error_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/quota");
            then.status(429).json_body(json!({ "error": "quota exceeded" }));
        });

        let http = reqwest::Client::new();
        let response: ApiResponse<serde_json::Value> =
            send(&http, &server.url("/quota"), RequestOptions::get()).await;

        assert_eq!(response.status(), Some(429));
        assert_eq!(response.message(), Some("API Error: quota exceeded"));
        mock.assert();
    }

    #[tokio::test]
    async fn empty_error_body_uses_status_line() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/empty");
            then.status(404);
        });

        let http = reqwest::Client::new();
        let response: ApiResponse<serde_json::Value> =
            send(&http, &server.url("/empty"), RequestOptions::get()).await;

        assert_eq!(response.message(), Some("API Error: 404 Not Found"));
    }

    #[tokio::test]
    async fn network_failure_has_no_status() {
        // Nothing listens on this port.
        let http = reqwest::Client::new();
        let response: ApiResponse<serde_json::Value> =
            send(&http, "http://127.0.0.1:9/none", RequestOptions::get()).await;

        assert!(!response.is_success());
        assert!(response.status().is_none());
        assert!(
            response
                .message()
                .unwrap()
                .starts_with("Network or client error:")
        );
        assert!(matches!(response.error(), Some(Error::Request(_))));
    }

    #[tokio::test]
    async fn no_content_deserializes_into_unit() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/gone");
            then.status(204);
        });

        let http = reqwest::Client::new();
        let response: ApiResponse<()> = send(
            &http,
            &server.url("/gone"),
            RequestOptions::delete().expect_status(&[204]),
        )
        .await;

        assert!(response.is_success());
        assert_eq!(response.status(), Some(204));
        mock.assert();
    }

    #[tokio::test]
    async fn unexpected_success_status_is_still_success() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/created");
            then.status(202).json_body(json!({ "ok": true }));
        });

        let http = reqwest::Client::new();
        let response: ApiResponse<serde_json::Value> = send(
            &http,
            &server.url("/created"),
            RequestOptions::post().json(json!({})),
        )
        .await;

        assert!(response.is_success());
        assert_eq!(response.status(), Some(202));
    }

    #[tokio::test]
    async fn query_params_and_headers_are_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/q")
                .query_param("page", "1")
                .header("Authorization", "Bearer tok");
            then.status(200).json_body(json!([]));
        });

        let http = reqwest::Client::new();
        let response: ApiResponse<Vec<serde_json::Value>> = send(
            &http,
            &server.url("/q"),
            RequestOptions::get()
                .query("page", "1")
                .header("Authorization", "Bearer tok"),
        )
        .await;

        assert!(response.is_success());
        mock.assert();
    }
}
