//! Emailnator provider.
//!
//! Emailnator has no token API; it authenticates with a Laravel session
//! cookie and an XSRF token obtained by scraping the `Set-Cookie` headers of
//! the homepage. Both values are stored on the account so later calls can
//! replay them. Message detail comes back as JSON or raw HTML depending on
//! the message source; both shapes are handled.
//!
//! Deletion is not offered by the service, so this provider leaves the
//! delete capabilities unimplemented.

use crate::http::{RequestOptions, send};
use crate::{
    ApiResponse, EmailAccount, EmailMessage, EmailMessageSummary, EmailProvider, Error,
    ProviderData, ReceivedAt,
};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{SET_COOKIE, USER_AGENT};
use serde::Deserialize;
use serde_json::json;
use std::sync::LazyLock;

const EMAILNATOR_BASE_URL: &str = "https://www.emailnator.com";
const PROVIDER_NAME: &str = "emailnator";
const USER_AGENT_VALUE: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:137.0) Gecko/20100101 Firefox/137.0";

// Service-injected ad messages, keyed by message id.
const AD_MESSAGE_IDS: &[&str] = &["ADSVPN"];

// The detail endpoint answers with rendered HTML for scraped messages, so
// that call advertises a browser-like Accept instead of JSON-first.
const DETAIL_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

static XSRF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"XSRF-TOKEN=([^;]+)").expect("static regex"));
static SESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"gmailnator_session=([^;]+)").expect("static regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));

/// Client for emailnator.com.
pub struct EmailnatorProvider {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl EmailnatorProvider {
    /// Provider pointed at the public emailnator.com deployment.
    pub fn new() -> Self {
        Self::with_base_url(EMAILNATOR_BASE_URL)
    }

    /// Override the base URL (primarily for testing).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            user_agent: USER_AGENT_VALUE.to_string(),
        }
    }

    /// Scrape the session cookie and XSRF token from the homepage response.
    async fn session_tokens(&self) -> ApiResponse<SessionTokens> {
        let response = match self
            .http
            .get(&self.base_url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return ApiResponse::failure_with(
                    format!("Network or client error: {err}"),
                    Error::Request(err),
                );
            }
        };

        let cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok().map(str::to_string))
            .collect();
        if cookies.is_empty() {
            return ApiResponse::failure("Could not retrieve cookies from Emailnator.");
        }

        let joined = cookies.join("; ");
        let decoded = urlencoding::decode(&joined)
            .map(|cow| cow.into_owned())
            .unwrap_or(joined);

        let xsrf_token = XSRF_RE
            .captures(&decoded)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        let session = SESSION_RE
            .captures(&decoded)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        match (xsrf_token, session) {
            (Some(xsrf_token), Some(session)) => ApiResponse::success(SessionTokens {
                cookie: format!("XSRF-TOKEN={xsrf_token}; gmailnator_session={session}"),
                xsrf_token,
            }),
            _ => ApiResponse::failure_with(
                "Could not parse XSRF or session token from cookies.",
                Error::SessionParse(decoded),
            ),
        }
    }

    /// Validate account ownership and pull out the stored session state.
    fn credentials(&self, account: &EmailAccount) -> Result<(String, String), String> {
        if account.provider_name != PROVIDER_NAME {
            return Err(format!("Invalid account type for {PROVIDER_NAME}."));
        }
        match &account.provider_data {
            ProviderData::Emailnator { cookie, xsrf_token } => {
                Ok((cookie.clone(), xsrf_token.clone()))
            }
            _ => Err(format!("Account is missing {PROVIDER_NAME} credentials.")),
        }
    }

    fn session_request(&self, cookie: &str, xsrf_token: &str) -> RequestOptions {
        RequestOptions::post()
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json, text/plain, */*")
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Cookie", cookie)
            .header("X-XSRF-TOKEN", xsrf_token)
            .header("Sec-Fetch-Dest", "empty")
            .header("Sec-Fetch-Mode", "cors")
            .header("Sec-Fetch-Site", "same-origin")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

impl Default for EmailnatorProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailProvider for EmailnatorProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn create_account(&self) -> ApiResponse<EmailAccount> {
        let tokens = match self.session_tokens().await {
            ApiResponse::Success { data, .. } => data,
            ApiResponse::Failure {
                status,
                message,
                error,
            } => {
                return ApiResponse::Failure {
                    status,
                    message,
                    error,
                };
            }
        };

        let created = match send::<EmailnatorCreateResponse>(
            &self.http,
            &self.url("/generate-email"),
            self.session_request(&tokens.cookie, &tokens.xsrf_token)
                .json(json!({ "email": ["domain", "plusGmail", "dotGmail", "googleMail"] })),
        )
        .await
        {
            ApiResponse::Success { data, .. } => data,
            ApiResponse::Failure {
                status,
                message,
                error,
            } => {
                return ApiResponse::Failure {
                    status,
                    message,
                    error,
                };
            }
        };

        let Some(address) = created.email.into_iter().next() else {
            return ApiResponse::failure("Failed to generate email address from Emailnator.");
        };

        ApiResponse::success(EmailAccount {
            provider_name: PROVIDER_NAME.to_string(),
            address,
            provider_data: ProviderData::Emailnator {
                cookie: tokens.cookie,
                xsrf_token: tokens.xsrf_token,
            },
        })
    }

    async fn get_messages(
        &self,
        account: &EmailAccount,
    ) -> ApiResponse<Vec<EmailMessageSummary>> {
        let (cookie, xsrf_token) = match self.credentials(account) {
            Ok(creds) => creds,
            Err(message) => return ApiResponse::failure(message),
        };

        send::<EmailnatorMessageList>(
            &self.http,
            &self.url("/message-list"),
            self.session_request(&cookie, &xsrf_token)
                .json(json!({ "email": account.address })),
        )
        .await
        .map(|list| {
            list.message_data
                .into_iter()
                .filter(|entry| !AD_MESSAGE_IDS.contains(&entry.message_id.as_str()))
                .map(|entry| EmailMessageSummary {
                    id: entry.message_id,
                    from: entry.from,
                    subject: entry.subject,
                    intro: None,
                    received_at: ReceivedAt::Raw(entry.time),
                    seen: None,
                })
                .collect()
        })
    }

    async fn get_message(
        &self,
        account: &EmailAccount,
        message_id: &str,
    ) -> ApiResponse<EmailMessage> {
        let (cookie, xsrf_token) = match self.credentials(account) {
            Ok(creds) => creds,
            Err(message) => return ApiResponse::failure(message),
        };
        if message_id.trim().is_empty() {
            return ApiResponse::failure("Missing message id.");
        }

        let referer = format!("{}/inbox/{}/{message_id}", self.base_url, account.address);
        let response = send::<serde_json::Value>(
            &self.http,
            &self.url("/message-list"),
            self.session_request(&cookie, &xsrf_token)
                .header("Accept", DETAIL_ACCEPT)
                .header("Referer", &referer)
                .json(json!({ "email": account.address, "messageID": message_id })),
        )
        .await;

        let (status, body) = match response {
            ApiResponse::Success { status, data } => (status, data),
            ApiResponse::Failure {
                status,
                message,
                error,
            } => {
                return ApiResponse::Failure {
                    status,
                    message,
                    error,
                };
            }
        };

        match body {
            // Raw HTML: the message as Emailnator renders it.
            serde_json::Value::String(html) => {
                let message = parse_html_message(message_id, &html);
                ApiResponse::Success {
                    status,
                    data: message,
                }
            }
            body @ serde_json::Value::Object(_) => {
                match serde_json::from_value::<EmailnatorMessageDetail>(body) {
                    Ok(detail) => ApiResponse::Success {
                        status,
                        data: EmailMessage {
                            id: detail.message_id.unwrap_or_else(|| message_id.to_string()),
                            from: detail.from,
                            subject: detail.subject,
                            intro: None,
                            received_at: ReceivedAt::Raw(detail.time),
                            seen: None,
                            body_html: Some(detail.content),
                            body_text: None,
                            attachments: None,
                        },
                    },
                    Err(err) => ApiResponse::Failure {
                        status,
                        message: format!("Unexpected response shape: {err}"),
                        error: Some(Error::Json(err)),
                    },
                }
            }
            _ => ApiResponse::Failure {
                status,
                message: "Unexpected content type received from Emailnator.".to_string(),
                error: None,
            },
        }
    }
}

struct SessionTokens {
    cookie: String,
    xsrf_token: String,
}

#[derive(Debug, Deserialize)]
struct EmailnatorCreateResponse {
    email: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmailnatorMessageList {
    #[serde(rename = "messageData")]
    message_data: Vec<EmailnatorMessageEntry>,
}

#[derive(Debug, Deserialize)]
struct EmailnatorMessageEntry {
    #[serde(rename = "messageID")]
    message_id: String,
    from: String,
    subject: String,
    time: String,
}

#[derive(Debug, Deserialize)]
struct EmailnatorMessageDetail {
    #[serde(rename = "messageID")]
    message_id: Option<String>,
    from: String,
    subject: String,
    time: String,
    content: String,
}

/// Extract message fields from the HTML rendering. The page embeds a header
/// block of the form `From: ... Subject: ... Time: ...` followed by the body.
fn parse_html_message(message_id: &str, html: &str) -> EmailMessage {
    let stripped = TAG_RE.replace_all(html, " ");

    let from = between(&stripped, "From: ", "Subject: ").unwrap_or_default();
    let subject = between(&stripped, "Subject: ", "Time: ").unwrap_or_default();
    let time = stripped
        .split("Time: ")
        .nth(1)
        .map(|rest| rest.trim().to_string())
        .unwrap_or_default();

    EmailMessage {
        id: message_id.to_string(),
        from,
        subject,
        intro: None,
        received_at: ReceivedAt::Raw(time),
        seen: None,
        body_html: Some(html.to_string()),
        body_text: Some(stripped.split_whitespace().collect::<Vec<_>>().join(" ")),
        attachments: None,
    }
}

fn between(text: &str, start: &str, end: &str) -> Option<String> {
    text.split(start)
        .nth(1)?
        .split(end)
        .next()
        .map(|value| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;

    fn account(address: &str) -> EmailAccount {
        EmailAccount {
            provider_name: PROVIDER_NAME.to_string(),
            address: address.to_string(),
            provider_data: ProviderData::Emailnator {
                cookie: "XSRF-TOKEN=abc=; gmailnator_session=sess123".to_string(),
                xsrf_token: "abc=".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn create_account_bootstraps_session_and_generates_address() {
        let server = MockServer::start();

        let bootstrap_mock = server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).header(
                "Set-Cookie",
                "XSRF-TOKEN=abc%3D; gmailnator_session=sess123; path=/",
            );
        });
        let generate_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/generate-email")
                .header("X-XSRF-TOKEN", "abc=")
                .header("Cookie", "XSRF-TOKEN=abc=; gmailnator_session=sess123");
            then.status(200)
                .json_body(serde_json::json!({ "email": ["gen123@gmail.com"] }));
        });

        let provider = EmailnatorProvider::with_base_url(server.base_url());
        let response = provider.create_account().await;

        let created = response.into_data().expect("create_account should succeed");
        assert_eq!(created.provider_name, "emailnator");
        assert_eq!(created.address, "gen123@gmail.com");
        match created.provider_data {
            ProviderData::Emailnator { cookie, xsrf_token } => {
                assert_eq!(xsrf_token, "abc=");
                assert!(cookie.contains("gmailnator_session=sess123"));
            }
            ProviderData::MailTm { .. } => panic!("wrong provider data variant"),
        }

        bootstrap_mock.assert();
        generate_mock.assert();
    }

    #[tokio::test]
    async fn bootstrap_without_cookies_fails() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        });

        let provider = EmailnatorProvider::with_base_url(server.base_url());
        let response = provider.create_account().await;

        assert_eq!(
            response.message(),
            Some("Could not retrieve cookies from Emailnator.")
        );
    }

    #[tokio::test]
    async fn unparsable_cookies_fail_with_cause() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).header("Set-Cookie", "unrelated=1; path=/");
        });

        let provider = EmailnatorProvider::with_base_url(server.base_url());
        let response = provider.create_account().await;

        assert_eq!(
            response.message(),
            Some("Could not parse XSRF or session token from cookies.")
        );
        assert!(matches!(response.error(), Some(Error::SessionParse(_))));
    }

    #[tokio::test]
    async fn get_messages_filters_ad_entries() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/message-list")
                .json_body(serde_json::json!({ "email": "gen123@gmail.com" }));
            then.status(200).json_body(serde_json::json!({
                "messageData": [
                    { "messageID": "ADSVPN", "from": "ads", "subject": "buy vpn", "time": "now" },
                    { "messageID": "m1", "from": "alice@example.com", "subject": "hi", "time": "just now" }
                ]
            }));
        });

        let provider = EmailnatorProvider::with_base_url(server.base_url());
        let response = provider.get_messages(&account("gen123@gmail.com")).await;

        let messages = response.into_data().expect("get_messages should succeed");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "m1");
        assert!(matches!(&messages[0].received_at, ReceivedAt::Raw(raw) if raw == "just now"));
        mock.assert();
    }

    #[tokio::test]
    async fn get_message_handles_json_detail() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/message-list")
                .json_body(serde_json::json!({
                    "email": "gen123@gmail.com",
                    "messageID": "m1"
                }));
            then.status(200).json_body(serde_json::json!({
                "messageID": "m1",
                "from": "alice@example.com",
                "subject": "hi",
                "time": "just now",
                "content": "<p>hello</p>"
            }));
        });

        let provider = EmailnatorProvider::with_base_url(server.base_url());
        let response = provider
            .get_message(&account("gen123@gmail.com"), "m1")
            .await;

        let message = response.into_data().expect("get_message should succeed");
        assert_eq!(message.id, "m1");
        assert_eq!(message.from, "alice@example.com");
        assert_eq!(message.body_html.as_deref(), Some("<p>hello</p>"));
    }

    #[tokio::test]
    async fn get_message_scrapes_html_detail() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/message-list")
                .header("Accept", DETAIL_ACCEPT);
            then.status(200)
                .header("Content-Type", "text/html")
                .body("<div>From: alice@example.com Subject: Hi there Time: just now</div><div dir=\"ltr\">Hello body</div>");
        });

        let provider = EmailnatorProvider::with_base_url(server.base_url());
        let response = provider
            .get_message(&account("gen123@gmail.com"), "m1")
            .await;

        let message = response.into_data().expect("get_message should succeed");
        assert_eq!(message.from, "alice@example.com");
        assert_eq!(message.subject, "Hi there");
        assert!(message.body_html.unwrap().contains("dir=\"ltr\""));
        assert!(message.body_text.unwrap().contains("Hello body"));
        mock.assert();
    }

    #[tokio::test]
    async fn foreign_account_is_rejected_without_transport() {
        let provider = EmailnatorProvider::with_base_url("http://127.0.0.1:9");
        let mut foreign = account("gen123@gmail.com");
        foreign.provider_name = "mail.tm".to_string();

        let response = provider.get_messages(&foreign).await;
        assert_eq!(
            response.message(),
            Some("Invalid account type for emailnator.")
        );
    }
}
