//! The polymorphic contract every email provider implements.

use crate::{ApiResponse, EmailAccount, EmailMessage, EmailMessageSummary};
use async_trait::async_trait;

/// An optional operation a provider may support.
///
/// Deletion is not universal across temp-mail services, so support is
/// queried at call time instead of being part of the required surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Server-side deletion of a single message.
    DeleteMessage,
    /// Server-side destruction of the whole account.
    DeleteAccount,
}

/// Contract for a disposable email provider.
///
/// Required operations provision a mailbox and read its contents. The delete
/// operations are optional capabilities: the defaults report the capability
/// as unsupported, and [`EmailProvider::supports`] defaults to `false`.
/// Implementations that do support deletion must override `supports` and the
/// corresponding method together.
///
/// Every operation returns an [`ApiResponse`] rather than an error type;
/// implementations convert transport failures into failure envelopes before
/// returning. An operation handed an account whose `provider_name` does not
/// match, or whose [`ProviderData`](crate::ProviderData) variant belongs to a
/// different provider family, fails locally without touching the network.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Stable name of this provider. Used as the registry key and stamped
    /// onto every account the provider creates.
    fn provider_name(&self) -> &str;

    /// Provision a new mailbox. Each call creates a fresh address; the
    /// operation is never idempotent.
    async fn create_account(&self) -> ApiResponse<EmailAccount>;

    /// List the current inbox contents for the given account.
    async fn get_messages(&self, account: &EmailAccount)
    -> ApiResponse<Vec<EmailMessageSummary>>;

    /// Fetch the full content of one message.
    async fn get_message(&self, account: &EmailAccount, message_id: &str)
    -> ApiResponse<EmailMessage>;

    /// Whether this provider implements the given optional capability.
    fn supports(&self, _capability: Capability) -> bool {
        false
    }

    /// Delete a single message server-side.
    async fn delete_message(
        &self,
        _account: &EmailAccount,
        _message_id: &str,
    ) -> ApiResponse<()> {
        ApiResponse::failure(format!(
            "Provider \"{}\" does not support deleting messages.",
            self.provider_name()
        ))
    }

    /// Destroy the account server-side.
    async fn delete_account(&self, _account: &EmailAccount) -> ApiResponse<()> {
        ApiResponse::failure(format!(
            "Provider \"{}\" does not support deleting accounts.",
            self.provider_name()
        ))
    }
}
