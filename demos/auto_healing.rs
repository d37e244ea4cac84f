//! Self-healing example.
//!
//! The schema below is hard to satisfy on the first try: a last name that
//! must be an email, and a number that must be at least 200. Validation
//! errors are fed back to the model up to two times.
//!
//! Run with:
//! ```bash
//! OPENAI_API_KEY=your-key RUST_LOG=mindshape_healing=info cargo run --example auto_healing
//! ```

use mindshape::prelude::*;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Deliberately odd customer details.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct Info {
    /// Surname, formatted as an email address.
    #[schemars(email)]
    pub last_name: String,
    /// A value of at least 200.
    #[schemars(range(min = 200))]
    pub negative_value: f64,
}

/// A character with details.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct Character {
    /// Character name.
    pub name: String,
    /// Details.
    pub info: Vec<Info>,
}

/// Characters as customers.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FictionalCharacters {
    /// The characters.
    pub customers: Vec<Character>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = MindConfig::from_env()?.with_mind(MindOptions::new().auto_healing(2));
    let mut mind = mind(config)?.with_observer(|attempt: u32, plan: &str| {
        println!("Healing attempt {attempt}: {plan}");
    });

    let functions = FunctionSet::new().with_function(
        "fictional_chars",
        "Generate a list of characters",
        Contract::<FictionalCharacters>::of(),
    );

    match mind
        .invoke(
            "3 fictional characters from popular sci-fi books as customers.",
            &functions,
            Some("fictional_chars"),
        )
        .await?
    {
        Outcome::Success(invocation) => {
            let characters: FictionalCharacters = invocation.parse()?;
            println!("{characters:#?}");
        }
        Outcome::Problem(problem) => {
            println!("Gave up with a {} problem: {}", problem.kind, problem.message);
            for error in &problem.detail {
                println!("  {}: {}", error.display_path(), error.message);
            }
        }
    }

    Ok(())
}
