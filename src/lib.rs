//! # MailBucket
//! Unified asynchronous client for disposable email services, providing one API to provision throwaway mailboxes, poll their inboxes, and (where supported) delete messages and accounts across multiple unaffiliated providers via [`MailBucket`].
//!
//! ## Audience and uses
//! For Rust developers who need throwaway addresses in integration tests, demos, or automation scripts without caring which temp-mail service backs them: build a [`MailBucket`] (the defaults register mail.tm and mail.gw), create an account on a named or randomly chosen provider, then poll for messages with the account the bucket hands back.
//!
//! ## Runtime requirements
//! Async-only; run inside a Tokio (v1) runtime. HTTP calls use `reqwest`, so ensure the chosen Tokio features (`rt-multi-thread` or `current_thread`) are available in your application.
//!
//! ## Out of scope
//! Not a general-purpose mail client, SMTP sender, or durable mailbox. It only proxies third-party temp-mail services and inherits their availability, spam filtering, and retention limits. No retries, caching, or rate limiting.
//!
//! ## Errors
//! Nothing here returns `Result` or panics across the public boundary: every operation yields an [`ApiResponse`], with failures carrying a human-readable message and, when available, the underlying [`Error`] cause. Branch on the response variant and read the message for diagnostics.
//!
//! ## Example
//! ```no_run
//! use mailbucket::MailBucket;
//!
//! #[tokio::main]
//! async fn main() {
//!     let bucket = MailBucket::new();
//!
//!     let created = bucket.create_account(None).await;
//!     let Some(account) = created.data() else {
//!         eprintln!("{}", created.message().unwrap_or("unknown failure"));
//!         return;
//!     };
//!     println!("Created: {}", account.address);
//!
//!     let inbox = bucket.get_messages(account).await;
//!     for msg in inbox.data().into_iter().flatten() {
//!         println!("From: {}, Subject: {}", msg.from, msg.subject);
//!     }
//! }
//! ```

mod bucket;
mod error;
mod http;
mod models;
mod provider;
pub mod providers;
mod response;

pub use bucket::{BucketBuilder, MailBucket};
pub use error::Error;
pub use models::{
    Attachment, EmailAccount, EmailMessage, EmailMessageSummary, ProviderData, ReceivedAt,
};
pub use provider::{Capability, EmailProvider};
pub use response::ApiResponse;
