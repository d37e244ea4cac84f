//! Function invocation example.
//!
//! Offers two functions and lets the model pick the one that fits the
//! request, then acts on the typed arguments.
//!
//! Run with:
//! ```bash
//! OPENAI_API_KEY=your-key cargo run --example invoke
//! ```

use mindshape::prelude::*;
use rand::Rng;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Bounds for a random number.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct NumberRange {
    /// Lower bound, inclusive.
    pub from: i64,
    /// Upper bound, exclusive.
    pub to: i64,
}

/// A quote.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct Quote {
    /// The quote text.
    pub quote: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut mind = mind(MindConfig::from_env()?)?;
    let functions = FunctionSet::new()
        .with_function(
            "random_number",
            "Generate a random number between two numbers.",
            Contract::<NumberRange>::of(),
        )
        .with_function("random_quote", "Generate a random quote.", Contract::<Quote>::of());

    let invocation = mind
        .invoke("Random number between 1 and 42", &functions, None)
        .await?
        .into_result()?;
    println!("Model is calling function \"{}\"", invocation.name());

    match invocation.name() {
        "random_number" => {
            let range: NumberRange = invocation.parse()?;
            if range.from < range.to {
                let n = rand::thread_rng().gen_range(range.from..range.to);
                println!("The random number is {n}");
            } else {
                println!("Empty range: {range:?}");
            }
        }
        _ => {
            let quote: Quote = invocation.parse()?;
            println!("Quote instead: {}", quote.quote);
        }
    }

    Ok(())
}
