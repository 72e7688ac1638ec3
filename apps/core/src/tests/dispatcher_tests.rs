//! Task Dispatcher Tests
//!
//! Template selection, error isolation and concurrent dispatch.

use crate::brain::Intent;
use crate::tasks::templates::TRANSCRIPT_MARKER;
use crate::tasks::{TaskDispatcher, TaskRequest};
use crate::tests::actor_tests::MockLlmActor;
use std::sync::Arc;
use tokio::time::Duration;

fn dispatcher(llm: MockLlmActor) -> (TaskDispatcher<MockLlmActor>, Arc<MockLlmActor>) {
    let llm = Arc::new(llm);
    (TaskDispatcher::new(Arc::clone(&llm)), llm)
}

#[cfg(test)]
mod dispatch_tests {
    use super::*;

    #[tokio::test]
    async fn test_completion_passes_through_unmodified() {
        let raw = "  **Sentiment:** Positive\n**Confidence:** 90%\n\n";
        let (dispatcher, llm) = dispatcher(MockLlmActor::new(raw));

        let result = dispatcher
            .dispatch(TaskRequest::new(Intent::SentimentAnalysis, "I love it", "I love it"))
            .await;

        assert!(!result.is_error);
        assert_eq!(result.task_label, "sentiment_analysis");
        assert_eq!(result.result_text, raw);

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 500);
        assert!(calls[0].0.contains("**Justification:**"));
        assert!(calls[0].0.contains("I love it"));
    }

    #[tokio::test]
    async fn test_every_intent_makes_exactly_one_call() {
        for intent in Intent::ALL {
            let (dispatcher, llm) = dispatcher(MockLlmActor::new("ok"));
            let result = dispatcher
                .dispatch(TaskRequest::new(intent, "content", "query"))
                .await;
            assert!(!result.is_error);
            assert_eq!(llm.calls().len(), 1, "{}", intent);
        }
    }

    #[tokio::test]
    async fn test_clarification_uses_its_own_label() {
        let (dispatcher, llm) = dispatcher(MockLlmActor::new("What would you like?"));

        let result = dispatcher
            .dispatch(TaskRequest::new(Intent::NeedsClarification, "some file text", ""))
            .await;

        assert_eq!(result.task_label, "clarification");
        assert_eq!(llm.calls()[0].1, 300);
    }

    #[tokio::test]
    async fn test_error_isolation() {
        let (dispatcher, _llm) = dispatcher(MockLlmActor::new("fine").failing_times(1));
        let request = TaskRequest::new(Intent::Summarization, "long text", "summarize");

        let failed = dispatcher.dispatch(request.clone()).await;
        assert!(failed.is_error);
        assert_eq!(failed.task_label, "summarization");
        assert!(failed.result_text.starts_with("Error executing task: "));
        assert!(failed.result_text.contains("Mock failure"));

        let recovered = dispatcher.dispatch(request).await;
        assert!(!recovered.is_error);
        assert_eq!(recovered.result_text, "fine");
    }

    #[tokio::test]
    async fn test_error_label_is_requested_intent() {
        let (dispatcher, _llm) = dispatcher(MockLlmActor::failing());

        let result = dispatcher
            .dispatch(TaskRequest::new(Intent::NeedsClarification, "x", ""))
            .await;

        assert!(result.is_error);
        assert_eq!(result.task_label, "needs_clarification");
    }

    #[tokio::test]
    async fn test_unknown_label_falls_back_to_conversation() {
        let (dispatcher, llm) = dispatcher(MockLlmActor::new("hi"));

        let result = dispatcher.dispatch_label("translation", "hola", "hola").await;

        assert_eq!(result.task_label, "conversational");
        assert_eq!(llm.calls()[0].1, 1000);
    }

    #[tokio::test]
    async fn test_known_label_is_dispatched() {
        let (dispatcher, _llm) = dispatcher(MockLlmActor::new("1. ship"));
        let result = dispatcher.dispatch_label("action_items", "ship it", "todo").await;
        assert_eq!(result.task_label, "action_items");
    }
}

#[cfg(test)]
mod youtube_dispatch_tests {
    use super::*;

    #[tokio::test]
    async fn test_transcript_with_summary_request() {
        let (dispatcher, llm) = dispatcher(MockLlmActor::new("summary"));
        let content = format!(
            "summarize https://youtu.be/dQw4w9WgXcQ\n\n{}\nnever gonna give you up",
            TRANSCRIPT_MARKER
        );

        let result = dispatcher
            .dispatch(TaskRequest::new(
                Intent::YoutubeTranscript,
                content,
                "summarize https://youtu.be/dQw4w9WgXcQ",
            ))
            .await;

        assert_eq!(result.task_label, "summarization");
        let (prompt, max_tokens) = llm.calls().remove(0);
        assert!(prompt.contains("**One-line summary:**"));
        assert!(prompt.contains("**Key Points:**"));
        assert!(prompt.contains("never gonna give you up"));
        assert_eq!(max_tokens, 1500);
    }

    #[tokio::test]
    async fn test_transcript_with_tone_request() {
        let (dispatcher, llm) = dispatcher(MockLlmActor::new("Positive"));
        let content = format!("{}\nwhat a great day", TRANSCRIPT_MARKER);

        let result = dispatcher
            .dispatch(TaskRequest::new(
                Intent::YoutubeTranscript,
                content,
                "what's the tone of youtu.be/dQw4w9WgXcQ",
            ))
            .await;

        assert_eq!(result.task_label, "sentiment_analysis");
        assert!(llm.last_prompt().unwrap().contains("**Sentiment:**"));
    }

    #[tokio::test]
    async fn test_missing_transcript_uses_limitation_notice() {
        let (dispatcher, llm) = dispatcher(MockLlmActor::new("Sorry"));
        let query = "summarize https://youtu.be/dQw4w9WgXcQ";

        let result = dispatcher
            .dispatch(TaskRequest::new(Intent::YoutubeTranscript, query, query))
            .await;

        assert_eq!(result.task_label, "youtube_transcript");
        let (prompt, max_tokens) = llm.calls().remove(0);
        assert!(prompt.contains("could not be fetched"));
        assert!(!prompt.contains("**One-line summary:**"));
        assert_eq!(max_tokens, 500);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_dispatch_does_not_serialize() {
        let (dispatcher, llm) = dispatcher(MockLlmActor::new("ok").with_delay(300));

        let start = std::time::Instant::now();
        let results = futures::future::join_all((0..5).map(|i| {
            let dispatcher = dispatcher.clone();
            async move {
                dispatcher
                    .dispatch(TaskRequest::new(Intent::Conversational, format!("q{}", i), format!("q{}", i)))
                    .await
            }
        }))
        .await;

        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| !r.is_error));
        assert_eq!(llm.calls().len(), 5);
        assert!(start.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_one_failure_does_not_affect_siblings() {
        let (dispatcher, _llm) = dispatcher(MockLlmActor::new("ok").failing_times(1));

        let results = futures::future::join_all(
            (0..4).map(|_| dispatcher.dispatch(TaskRequest::new(Intent::ActionItems, "c", "todo"))),
        )
        .await;

        assert_eq!(results.iter().filter(|r| r.is_error).count(), 1);
        assert_eq!(results.iter().filter(|r| !r.is_error).count(), 3);
    }
}
