//! End-to-end tour of the MailBucket API.
//!
//! Features demonstrated:
//! - Listing registered providers
//! - Creating an account on a randomly chosen provider
//! - Polling the inbox for incoming messages
//! - Fetching full message content
//! - Deleting the message and account where the provider supports it

use mailbucket::{ApiResponse, MailBucket};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailbucket=debug".into()),
        )
        .init();

    println!("📧 MailBucket - Full Demo");
    println!("{}", "=".repeat(50));

    let bucket = MailBucket::new();

    println!("\n🌐 Registered providers:");
    for name in bucket.available_providers() {
        println!("   - {name}");
    }

    println!("\n📬 Creating a disposable mailbox (random provider)...");
    let account = match bucket.create_account(None).await {
        ApiResponse::Success { data, .. } => data,
        ApiResponse::Failure { message, .. } => {
            eprintln!("   ❌ {message}");
            return;
        }
    };
    println!("   ✅ {} via {}", account.address, account.provider_name);

    println!("\n⏳ Waiting for messages...");
    println!("   Send an email to: {}", account.address);
    println!("   (Polling for up to 2 minutes)");

    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_secs(120);
    let poll_interval = std::time::Duration::from_secs(5);

    loop {
        let messages = match bucket.get_messages(&account).await {
            ApiResponse::Success { data, .. } => data,
            ApiResponse::Failure { message, .. } => {
                eprintln!("\n   ❌ {message}");
                break;
            }
        };

        if !messages.is_empty() {
            println!("\n\n📥 Received {} message(s)!", messages.len());

            for msg in &messages {
                println!("\n{}", "-".repeat(50));
                println!("Message ID:  {}", msg.id);
                println!("From:        {}", msg.from);
                println!("Subject:     {}", msg.subject);

                println!("\n📄 Fetching full message...");
                match bucket.get_message(&account, &msg.id).await {
                    ApiResponse::Success { data, .. } => {
                        if let Some(text) = data.body_text.or(data.body_html) {
                            let preview: String = text.chars().take(500).collect();
                            println!("   {preview}");
                        }
                    }
                    ApiResponse::Failure { message, .. } => {
                        eprintln!("   ❌ {message}");
                    }
                }

                println!("\n🗑️  Deleting message...");
                match bucket.delete_message(&account, &msg.id).await {
                    ApiResponse::Success { .. } => println!("   ✅ Deleted"),
                    // Not every provider supports deletion; that's fine.
                    ApiResponse::Failure { message, .. } => println!("   ⚠️  {message}"),
                }
            }
            break;
        }

        if start.elapsed() >= timeout {
            println!("\n\n⚠️  Timeout: No messages received");
            break;
        }

        let remaining = (timeout - start.elapsed()).as_secs();
        print!("\r   Checking... {remaining} seconds remaining   ");
        use std::io::Write;
        std::io::stdout().flush().ok();

        tokio::time::sleep(poll_interval).await;
    }

    println!("\n🗑️  Cleaning up mailbox...");
    match bucket.delete_account(&account).await {
        ApiResponse::Success { .. } => println!("   ✅ Account deleted"),
        ApiResponse::Failure { message, .. } => println!("   ⚠️  {message}"),
    }

    println!("\n{}", "=".repeat(50));
    println!("✨ Demo complete!");
}
