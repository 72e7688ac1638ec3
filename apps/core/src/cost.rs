//! Rough pre-flight cost estimate for a request.

use serde::Serialize;

const CHARS_PER_TOKEN: u64 = 4;
/// Prompt templates and section markers add roughly half again on top of the raw input.
const PROMPT_OVERHEAD: f64 = 1.5;
const INPUT_USD_PER_TOKEN: f64 = 3.0 / 1_000_000.0;
const OUTPUT_USD_PER_TOKEN: f64 = 15.0 / 1_000_000.0;
const ASSUMED_OUTPUT_TOKENS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub estimated_input_tokens: u64,
    pub estimated_output_tokens: u64,
    pub estimated_cost_usd: f64,
    pub note: String,
}

/// Estimate from text length (in characters) and file size (in bytes).
pub fn estimate_cost(text: &str, file_size: u64) -> CostEstimate {
    let text_tokens = text.chars().count() as u64 / CHARS_PER_TOKEN;
    let file_tokens = file_size / CHARS_PER_TOKEN;
    let input_tokens = (text_tokens + file_tokens) as f64 * PROMPT_OVERHEAD;

    let cost = input_tokens * INPUT_USD_PER_TOKEN + ASSUMED_OUTPUT_TOKENS as f64 * OUTPUT_USD_PER_TOKEN;

    CostEstimate {
        estimated_input_tokens: input_tokens as u64,
        estimated_output_tokens: ASSUMED_OUTPUT_TOKENS,
        estimated_cost_usd: (cost * 10_000.0).round() / 10_000.0,
        note: "This is an approximation. Actual costs may vary.".to_string(),
    }
}
