//! # Brain Module
//!
//! Fast, non-LLM analysis of a request, run BEFORE any model call.
//!
//! ## Components
//! - `patterns`: keyword tables and code-structure regexes
//! - `intent`: rule-based intent classification and confidence scoring

pub mod intent;
pub mod patterns;

pub use intent::{ClassificationInput, ClassificationResult, Intent, IntentClassifier};
