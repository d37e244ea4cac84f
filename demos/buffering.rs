//! Buffering example.
//!
//! Stages a user turn and an assistant turn locally, then asks a question
//! that depends on both.
//!
//! Run with:
//! ```bash
//! OPENAI_API_KEY=your-key cargo run --example buffering
//! ```

use mindshape::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut mind = mind(MindConfig::from_env()?)?;

    let client = mind.engine_mut().transport_mut();
    client.buffer(true);
    client
        .chat(
            "I'm going to tell you something, and you'll reply with 789.",
            &Default::default(),
        )
        .await?;
    client.set_agent_message("Seven Ate Nine");
    client.buffer(false);

    let reply = mind
        .plain_chat("Can you repeat what you previously said? Then repeat it in reverse.")
        .await?;
    println!("{reply}");

    Ok(())
}
