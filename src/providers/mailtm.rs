//! mail.tm / mail.gw provider.
//!
//! Both services expose the same API at different hosts, so one
//! implementation covers both registry entries. Provisioning flow:
//! 1) `GET /domains` and pick one at random
//! 2) `POST /accounts` with a generated address and password
//! 3) `POST /token` to obtain the bearer token stored on the account

use crate::http::{RequestOptions, send};
use crate::{
    ApiResponse, Attachment, Capability, EmailAccount, EmailMessage, EmailMessageSummary,
    EmailProvider, ProviderData, ReceivedAt,
};
use async_trait::async_trait;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use serde_json::json;

const MAIL_TM_BASE_URL: &str = "https://api.mail.tm";
const MAIL_GW_BASE_URL: &str = "https://api.mail.gw";

/// Client for the mail.tm API family. Supports both delete capabilities.
pub struct MailTmProvider {
    http: reqwest::Client,
    name: String,
    base_url: String,
}

impl MailTmProvider {
    /// Provider for a mail.tm-compatible deployment at the given base URL.
    ///
    /// `name` becomes the registry key and the `provider_name` stamped onto
    /// created accounts.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            name: name.into(),
            base_url: base_url.into(),
        }
    }

    /// The mail.tm deployment.
    pub fn mail_tm() -> Self {
        Self::new("mail.tm", MAIL_TM_BASE_URL)
    }

    /// The mail.gw deployment.
    pub fn mail_gw() -> Self {
        Self::new("mail.gw", MAIL_GW_BASE_URL)
    }

    /// Validate account ownership and pull out the bearer token and server
    /// account id.
    fn credentials(&self, account: &EmailAccount) -> Result<(String, String), String> {
        if account.provider_name != self.name {
            return Err(format!("Invalid account type for {}.", self.name));
        }
        match &account.provider_data {
            ProviderData::MailTm {
                token, account_id, ..
            } => Ok((token.clone(), account_id.clone())),
            _ => Err(format!("Account is missing {} credentials.", self.name)),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmailProvider for MailTmProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn create_account(&self) -> ApiResponse<EmailAccount> {
        let domains = match send::<Vec<MailTmDomain>>(
            &self.http,
            &self.url("/domains"),
            RequestOptions::get(),
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
                    message: format!("Failed to get domains from {}: {message}", self.name),
                    error,
                };
            }
        };

        let Some(domain) = domains.choose(&mut rand::rng()) else {
            return ApiResponse::failure(format!(
                "Failed to get domains from {}: no domains available",
                self.name
            ));
        };

        let address = format!("{}@{}", make_hash(10), domain.domain);
        let password = make_hash(12);

        let registered = match send::<MailTmAccount>(
            &self.http,
            &self.url("/accounts"),
            RequestOptions::post()
                .json(json!({ "address": address, "password": password }))
                .expect_status(&[201]),
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
                    message: format!("Failed to register account with {}: {message}", self.name),
                    error,
                };
            }
        };

        let token = match send::<MailTmToken>(
            &self.http,
            &self.url("/token"),
            RequestOptions::post().json(json!({ "address": address, "password": password })),
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
                    message: format!(
                        "Failed to login/get token from {} after registration: {message}",
                        self.name
                    ),
                    error,
                };
            }
        };

        ApiResponse::success(EmailAccount {
            provider_name: self.name.clone(),
            address,
            provider_data: ProviderData::MailTm {
                token: token.token,
                account_id: registered.id,
                password,
            },
        })
    }

    async fn get_messages(
        &self,
        account: &EmailAccount,
    ) -> ApiResponse<Vec<EmailMessageSummary>> {
        let (token, _) = match self.credentials(account) {
            Ok(creds) => creds,
            Err(message) => return ApiResponse::failure(message),
        };

        send::<Vec<MailTmMessage>>(
            &self.http,
            &self.url("/messages"),
            RequestOptions::get().header("Authorization", &format!("Bearer {token}")),
        )
        .await
        .map(|messages| messages.into_iter().map(MailTmMessage::into_summary).collect())
    }

    async fn get_message(
        &self,
        account: &EmailAccount,
        message_id: &str,
    ) -> ApiResponse<EmailMessage> {
        let (token, _) = match self.credentials(account) {
            Ok(creds) => creds,
            Err(message) => return ApiResponse::failure(message),
        };
        if message_id.trim().is_empty() {
            return ApiResponse::failure("Missing message id.");
        }

        send::<MailTmMessage>(
            &self.http,
            &self.url(&format!("/messages/{message_id}")),
            RequestOptions::get().header("Authorization", &format!("Bearer {token}")),
        )
        .await
        .map(MailTmMessage::into_message)
    }

    fn supports(&self, _capability: Capability) -> bool {
        true
    }

    async fn delete_message(&self, account: &EmailAccount, message_id: &str) -> ApiResponse<()> {
        let (token, _) = match self.credentials(account) {
            Ok(creds) => creds,
            Err(message) => return ApiResponse::failure(message),
        };
        if message_id.trim().is_empty() {
            return ApiResponse::failure("Missing message id.");
        }

        send::<()>(
            &self.http,
            &self.url(&format!("/messages/{message_id}")),
            RequestOptions::delete()
                .header("Authorization", &format!("Bearer {token}"))
                .expect_status(&[204]),
        )
        .await
    }

    async fn delete_account(&self, account: &EmailAccount) -> ApiResponse<()> {
        let (token, account_id) = match self.credentials(account) {
            Ok(creds) => creds,
            Err(message) => return ApiResponse::failure(message),
        };

        send::<()>(
            &self.http,
            &self.url(&format!("/accounts/{account_id}")),
            RequestOptions::delete()
                .header("Authorization", &format!("Bearer {token}"))
                .expect_status(&[204]),
        )
        .await
    }
}

/// Random lowercase alphanumeric string for addresses and passwords.
fn make_hash(len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

#[derive(Debug, Deserialize)]
struct MailTmDomain {
    domain: String,
}

#[derive(Debug, Deserialize)]
struct MailTmAccount {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MailTmToken {
    token: String,
}

#[derive(Debug, Deserialize)]
struct MailTmAddress {
    address: String,
    name: String,
}

/// Wire shape shared by the listing and detail endpoints; the listing simply
/// omits the body fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MailTmMessage {
    id: String,
    from: MailTmAddress,
    subject: String,
    intro: Option<String>,
    seen: Option<bool>,
    created_at: String,
    html: Option<Vec<String>>,
    text: Option<String>,
    attachments: Option<Vec<MailTmAttachment>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MailTmAttachment {
    id: String,
    filename: String,
    content_type: String,
    size: u64,
}

impl MailTmMessage {
    fn sender(&self) -> String {
        format!("{} <{}>", self.from.name, self.from.address)
    }

    fn into_summary(self) -> EmailMessageSummary {
        EmailMessageSummary {
            from: self.sender(),
            id: self.id,
            subject: self.subject,
            intro: self.intro,
            received_at: ReceivedAt::parse(&self.created_at),
            seen: self.seen,
        }
    }

    fn into_message(self) -> EmailMessage {
        EmailMessage {
            from: self.sender(),
            body_html: self.html.map(|parts| parts.concat()),
            id: self.id,
            subject: self.subject,
            intro: self.intro,
            received_at: ReceivedAt::parse(&self.created_at),
            seen: self.seen,
            body_text: self.text,
            attachments: self.attachments.map(|attachments| {
                attachments
                    .into_iter()
                    .map(|att| Attachment {
                        id: att.id,
                        filename: att.filename,
                        content_type: att.content_type,
                        size: att.size,
                    })
                    .collect()
            }),
        }
    }
}
