//! Account and message models shared by all providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A provisioned disposable mailbox plus the credentials needed to access it.
///
/// Accounts are created by a provider, stamped with that provider's name, and
/// immutable from the caller's perspective. They are plain data: serialize one
/// to reuse the mailbox in a later process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAccount {
    /// Name of the provider that created (and can service) this account.
    pub provider_name: String,
    /// The mailbox's email address.
    pub address: String,
    /// Provider-private session state. Only the issuing provider family
    /// interprets its own variant.
    pub provider_data: ProviderData,
}

/// Session/credential state issued by a provider to one of its accounts.
///
/// Each provider family gets its own variant, so the shape is statically
/// known to that provider's code and opaque to every other provider. A
/// provider handed an account carrying a foreign variant fails the call
/// locally instead of guessing at fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProviderData {
    /// mail.tm / mail.gw credentials.
    #[serde(rename_all = "camelCase")]
    MailTm {
        /// Bearer token for authenticated calls.
        token: String,
        /// Server-side account id, needed for account deletion.
        account_id: String,
        /// The generated password (kept so callers can re-authenticate).
        password: String,
    },
    /// Emailnator session state.
    #[serde(rename_all = "camelCase")]
    Emailnator {
        /// Session cookie string sent on every call.
        cookie: String,
        /// Anti-CSRF token paired with the cookie.
        xsrf_token: String,
    },
}

/// Inbox listing entry: headers only, no body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessageSummary {
    /// Provider-scoped message id.
    pub id: String,
    /// Sender, as the provider reports it (may be `Name <address>`).
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Short excerpt of the body, when the provider supplies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    /// When the message was received.
    pub received_at: ReceivedAt,
    /// Read flag, when the provider tracks one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seen: Option<bool>,
}

/// Full message content fetched on demand. Immutable snapshot; nothing is
/// cached locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    /// Provider-scoped message id.
    pub id: String,
    /// Sender, as the provider reports it.
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Short excerpt of the body, when the provider supplies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    /// When the message was received.
    pub received_at: ReceivedAt,
    /// Read flag, when the provider tracks one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seen: Option<bool>,
    /// HTML body, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    /// Plain-text body, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
    /// Attachment metadata, when the provider exposes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

/// Attachment metadata on a full message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Provider-scoped attachment id.
    pub id: String,
    /// Original filename.
    pub filename: String,
    /// MIME content type.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
}

/// Receipt time of a message.
///
/// mail.tm reports RFC 3339 timestamps; Emailnator reports human-readable
/// strings like `"just now"`. Both are preserved rather than forced through
/// a lossy parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReceivedAt {
    /// A parsed UTC timestamp.
    Timestamp(DateTime<Utc>),
    /// The provider's raw representation when it is not a timestamp.
    Raw(String),
}

impl ReceivedAt {
    /// Parse an RFC 3339 string, falling back to the raw text.
    pub fn parse(raw: &str) -> Self {
        match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Self::Timestamp(ts.with_timezone(&Utc)),
            Err(_) => Self::Raw(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_at_parses_rfc3339() {
        match ReceivedAt::parse("2024-05-01T12:30:00Z") {
            ReceivedAt::Timestamp(ts) => assert_eq!(ts.to_rfc3339(), "2024-05-01T12:30:00+00:00"),
            ReceivedAt::Raw(raw) => panic!("expected timestamp, got raw {raw:?}"),
        }
    }

    #[test]
    fn received_at_keeps_non_timestamps_raw() {
        match ReceivedAt::parse("just now") {
            ReceivedAt::Raw(raw) => assert_eq!(raw, "just now"),
            ReceivedAt::Timestamp(_) => panic!("expected raw"),
        }
    }

    #[test]
    fn account_round_trips_through_json() {
        let account = EmailAccount {
            provider_name: "mail.tm".to_string(),
            address: "abc@indigobook.com".to_string(),
            provider_data: ProviderData::MailTm {
                token: "t".to_string(),
                account_id: "id1".to_string(),
                password: "pw".to_string(),
            },
        };

        let json = serde_json::to_string(&account).unwrap();
        assert!(json.contains("\"providerName\":\"mail.tm\""));

        let back: EmailAccount = serde_json::from_str(&json).unwrap();
        assert_eq!(back.address, account.address);
        match back.provider_data {
            ProviderData::MailTm { account_id, .. } => assert_eq!(account_id, "id1"),
            ProviderData::Emailnator { .. } => panic!("wrong variant"),
        }
    }
}
