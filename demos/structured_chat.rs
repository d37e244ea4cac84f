//! Structured chat example.
//!
//! Asks for two typed answers in one conversation: the second question
//! refers back to the first answer.
//!
//! Run with:
//! ```bash
//! OPENAI_API_KEY=your-key cargo run --example structured_chat
//! ```

use mindshape::prelude::*;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// A customer of a fictional shop.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct Customer {
    /// Full name.
    pub name: String,
    /// Contact address.
    #[schemars(email)]
    pub email: String,
    /// Lifetime spend in USD.
    pub lifetime_spend: f64,
}

/// Customers found by the model.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct Customers {
    /// At least one customer.
    #[schemars(length(min = 1))]
    pub customers: Vec<Customer>,
}

/// The hat a customer wears.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CustomerHat {
    /// Customer name.
    pub name: String,
    /// Favorite hat.
    pub hat: String,
}

/// Favorite hats at an event.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FavoriteHats {
    /// Which event are the characters attending?
    pub event_name: String,
    /// One entry per customer.
    pub customer_hats: Vec<CustomerHat>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut mind = mind(MindConfig::from_env()?)?;

    let customers = mind
        .structured_chat(
            "3 fictional characters from popular sci-fi books as customers.",
            &Contract::<Customers>::of(),
        )
        .await?
        .into_result()?;
    println!("{customers:#?}");

    let hats = mind
        .structured_chat("What are their favorite hats?", &Contract::<FavoriteHats>::of())
        .await?
        .into_result()?;
    println!("{hats:#?}");

    Ok(())
}
