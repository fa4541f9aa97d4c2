use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::print_envelope;
use crate::models::QueryEnvelope;
use crate::present::EXAMPLE_QUESTIONS;

#[derive(Debug, Clone, Args)]
pub struct ExamplesArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &ExamplesArgs) -> Result<()> {
    if args.json {
        let questions = EXAMPLE_QUESTIONS
            .iter()
            .enumerate()
            .map(|(index, question)| json!({ "number": index + 1, "question": question }))
            .collect::<Vec<_>>();
        return print_envelope(&QueryEnvelope::ok(
            "examples",
            json!({ "questions": questions }),
        ));
    }

    for (index, question) in EXAMPLE_QUESTIONS.iter().enumerate() {
        println!("{}. {question}", index + 1);
    }
    Ok(())
}
