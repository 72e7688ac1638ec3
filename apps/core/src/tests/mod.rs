//! Test Module
//!
//! Cross-module test suite for the task router.
//!
//! ## Test Categories
//! - `actor_tests`: mock LLM actor, LLM actor handle against a mock Messages API
//! - `brain_tests`: intent classification order and confidence scoring
//! - `dispatcher_tests`: template selection, error isolation, concurrency
//! - `pipeline_tests`: request processing with mock extractors and transcripts
//! - `server_tests`: HTTP endpoints over a real socket

pub mod dispatcher_tests;
pub mod server_tests;
