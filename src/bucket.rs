//! Provider registry and dispatch facade.
//!
//! [`MailBucket`] is the single entry point consumers use. It resolves which
//! provider serves a call (explicit name, the account's stamped provider, or
//! a uniform random choice), delegates, and normalizes local validation
//! failures into [`ApiResponse`] so callers never special-case "no provider
//! found" versus "provider returned failure".

use crate::providers::MailTmProvider;
use crate::{
    ApiResponse, Capability, EmailAccount, EmailMessage, EmailMessageSummary, EmailProvider, Error,
};
use futures::FutureExt;
use rand::seq::IndexedRandom;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::debug;

/// Unified client over a set of registered email providers.
///
/// The bucket holds no per-call state: the registry is mutated only by
/// explicit registration, never by create/read/delete operations, so
/// concurrent calls against a shared bucket are independent.
///
/// # Examples
/// ```no_run
/// # use mailbucket::MailBucket;
/// # #[tokio::main]
/// # async fn main() {
/// let bucket = MailBucket::new();
/// let created = bucket.create_account(None).await;
/// if let Some(account) = created.data() {
///     println!("mailbox: {}", account.address);
/// }
/// # }
/// ```
pub struct MailBucket {
    providers: HashMap<String, Arc<dyn EmailProvider>>,
}

impl MailBucket {
    /// Create a bucket with the default provider set (mail.tm and mail.gw).
    pub fn new() -> Self {
        let mut bucket = Self::empty();
        bucket.register_provider(Arc::new(MailTmProvider::mail_tm()));
        bucket.register_provider(Arc::new(MailTmProvider::mail_gw()));
        bucket
    }

    /// Create a bucket with no providers registered.
    ///
    /// Useful when the caller wants full control over the provider set;
    /// operations on an empty bucket fail with
    /// `No email providers registered.`
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Create a [`BucketBuilder`] for assembling a custom provider set.
    pub fn builder() -> BucketBuilder {
        BucketBuilder::new()
    }

    /// Register a provider under its own name.
    ///
    /// Registration is last-write-wins: registering a second provider with
    /// the same name silently replaces the first. This supports hot-swapping
    /// an implementation without a separate unregister step.
    pub fn register_provider(&mut self, provider: Arc<dyn EmailProvider>) {
        let name = provider.provider_name().to_string();
        debug!(provider = %name, "registered provider");
        self.providers.insert(name, provider);
    }

    /// Names of all currently registered providers. Order is unspecified.
    pub fn available_providers(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Look up a provider by name. Pure lookup, no side effects.
    pub fn provider(&self, name: &str) -> Option<Arc<dyn EmailProvider>> {
        self.providers.get(name).cloned()
    }

    /// Provision a new mailbox.
    ///
    /// With `Some(name)`, the named provider is used and an unknown name
    /// fails without any transport call. With `None`, a provider is chosen
    /// uniformly at random among those registered.
    ///
    /// A panicking provider implementation is converted into a failure
    /// envelope here; no panic escapes this method.
    pub async fn create_account(&self, provider_name: Option<&str>) -> ApiResponse<EmailAccount> {
        let provider = match provider_name {
            Some(name) => match self.provider(name) {
                Some(provider) => provider,
                None => return ApiResponse::failure(format!("Provider \"{name}\" not found.")),
            },
            None => {
                let names = self.available_providers();
                let Some(name) = names.choose(&mut rand::rng()) else {
                    return ApiResponse::failure("No email providers registered.");
                };
                debug!(provider = %name, "using random provider");
                match self.provider(name) {
                    Some(provider) => provider,
                    None => {
                        return ApiResponse::failure(format!(
                            "Failed to get random provider instance for \"{name}\"."
                        ));
                    }
                }
            }
        };

        match AssertUnwindSafe(provider.create_account()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let reason = panic_reason(panic);
                ApiResponse::failure_with(
                    format!(
                        "Client error during account creation with {}: {reason}",
                        provider.provider_name()
                    ),
                    Error::ProviderPanic(reason),
                )
            }
        }
    }

    /// List the inbox of the given account via the provider that issued it.
    pub async fn get_messages(
        &self,
        account: &EmailAccount,
    ) -> ApiResponse<Vec<EmailMessageSummary>> {
        match self.provider_for_account(account) {
            Ok(provider) => provider.get_messages(account).await,
            Err(message) => ApiResponse::failure(message),
        }
    }

    /// Fetch the full content of one message.
    pub async fn get_message(
        &self,
        account: &EmailAccount,
        message_id: &str,
    ) -> ApiResponse<EmailMessage> {
        match self.provider_for_account(account) {
            Ok(provider) => provider.get_message(account, message_id).await,
            Err(message) => ApiResponse::failure(message),
        }
    }

    /// Delete one message server-side, if the issuing provider supports it.
    pub async fn delete_message(
        &self,
        account: &EmailAccount,
        message_id: &str,
    ) -> ApiResponse<()> {
        let provider = match self.provider_for_account(account) {
            Ok(provider) => provider,
            Err(message) => return ApiResponse::failure(message),
        };
        if !provider.supports(Capability::DeleteMessage) {
            return ApiResponse::failure(format!(
                "Provider \"{}\" does not support deleting messages.",
                account.provider_name
            ));
        }
        provider.delete_message(account, message_id).await
    }

    /// Destroy the account server-side, if the issuing provider supports it.
    pub async fn delete_account(&self, account: &EmailAccount) -> ApiResponse<()> {
        let provider = match self.provider_for_account(account) {
            Ok(provider) => provider,
            Err(message) => return ApiResponse::failure(message),
        };
        if !provider.supports(Capability::DeleteAccount) {
            return ApiResponse::failure(format!(
                "Provider \"{}\" does not support deleting accounts.",
                account.provider_name
            ));
        }
        provider.delete_account(account).await
    }

    /// Resolve strictly by the provider name stamped on the account.
    fn provider_for_account(
        &self,
        account: &EmailAccount,
    ) -> Result<Arc<dyn EmailProvider>, String> {
        self.provider(&account.provider_name).ok_or_else(|| {
            format!(
                "Provider \"{}\" associated with this account not found.",
                account.provider_name
            )
        })
    }
}

impl Default for MailBucket {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a [`MailBucket`] with a custom provider set.
///
/// Building without any providers falls back to the default set, matching
/// [`MailBucket::new`].
#[derive(Default)]
pub struct BucketBuilder {
    providers: Vec<Arc<dyn EmailProvider>>,
}

impl BucketBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider to register.
    pub fn provider(mut self, provider: Arc<dyn EmailProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Build the bucket, registering providers in the order they were added
    /// (later registrations win on name collisions).
    pub fn build(self) -> MailBucket {
        if self.providers.is_empty() {
            return MailBucket::new();
        }
        let mut bucket = MailBucket::empty();
        for provider in self.providers {
            bucket.register_provider(provider);
        }
        bucket
    }
}

fn panic_reason(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
