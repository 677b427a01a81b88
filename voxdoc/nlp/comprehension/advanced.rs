use anyhow::Result;
use futures::future::join_all;
use serde_json::json;

use crate::{
    comprehension::comprehension::{AnswerResult, AnswerSelector},
    telemetry::NlpTelemetry,
};

/// Answers many questions concurrently against one shared document.
pub struct BatchAnswerController {
    selector: AnswerSelector,
    telemetry: Option<NlpTelemetry>,
}

impl BatchAnswerController {
    /// Creates a new controller.
    #[must_use]
    pub fn new(selector: AnswerSelector, telemetry: Option<NlpTelemetry>) -> Self {
        Self {
            selector,
            telemetry,
        }
    }

    /// Runs each selection on the blocking pool; results keep input order.
    pub async fn answer_batch(&self, questions: Vec<String>) -> Result<Vec<AnswerResult>> {
        self.log("nlp.batch.start", questions.len());
        let tasks = questions.into_iter().map(|question| {
            let selector = self.selector.clone();
            tokio::task::spawn_blocking(move || selector.select(&question))
        });
        let mut results = Vec::new();
        for joined in join_all(tasks).await {
            results.push(joined?);
        }
        self.log("nlp.batch.complete", results.len());
        Ok(results)
    }

    fn log(&self, message: &str, count: usize) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                shared_logging::LogLevel::Info,
                message,
                json!({ "count": count }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::comprehension::comprehension::{DocumentContext, DEFAULT_FALLBACK};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn batch_preserves_order_and_matches_single_calls() {
        let context = DocumentContext::from_text(
            "inline",
            "Digital government improves public services. Citizens benefit from online access.",
            DEFAULT_FALLBACK,
        )
        .unwrap();
        let selector = AnswerSelector::new(Arc::new(context), None);
        let questions: Vec<String> = ["online access", "public services", "the of", "citizens"]
            .into_iter()
            .map(String::from)
            .collect();
        let controller = BatchAnswerController::new(selector.clone(), None);
        let results = controller.answer_batch(questions.clone()).await.unwrap();
        assert_eq!(results.len(), 4);
        for (question, result) in questions.iter().zip(&results) {
            assert_eq!(result, &selector.select(question));
        }
        assert_eq!(results[1].sentence, Some(0));
        assert!(!results[2].matched);
    }
}
