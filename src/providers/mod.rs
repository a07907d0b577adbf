//! Concrete provider implementations.

mod emailnator;
mod mailtm;

pub use emailnator::EmailnatorProvider;
pub use mailtm::MailTmProvider;
