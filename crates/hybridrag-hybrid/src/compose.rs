//! Grounded answer generation behind the relevance gate.

use std::sync::Arc;

use hybridrag_core::error::{Capability, Error, Result};
use hybridrag_core::traits::Generator;
use hybridrag_core::types::RetrievalResult;

use crate::gate::is_supported;
use crate::report::RetrievalReport;

/// Returned instead of a generated answer when the evidence is too thin.
pub const REFUSAL: &str = "Information not found in the documents.";

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Distinct contributing sources, first-seen order. Empty on refusal.
    pub sources: Vec<String>,
    pub refused: bool,
    pub report: RetrievalReport,
}

impl Answer {
    pub fn refusal(report: RetrievalReport) -> Self {
        Self { text: REFUSAL.to_string(), sources: Vec::new(), refused: true, report }
    }

    /// Display heuristic: three or more distinct sources is full confidence.
    pub fn confidence(&self) -> f32 {
        (self.sources.len() as f32 / 3.0).min(1.0)
    }
}

/// Fill the grounding template with the candidate texts, one per line, in
/// final order.
pub fn build_prompt(query: &str, results: &RetrievalResult) -> String {
    let context = results.texts().join("\n");
    format!(
        "Answer using only the context below.\n\
         If the answer is not present, say: Information not found.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {query}"
    )
}

#[derive(Clone)]
pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
    min_support: usize,
    max_length: usize,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn Generator>, min_support: usize, max_length: usize) -> Self {
        Self { generator, min_support, max_length }
    }

    pub fn compose(&self, query: &str, results: &RetrievalResult, report: RetrievalReport) -> Result<Answer> {
        if !is_supported(results, self.min_support) {
            tracing::warn!(chunks = results.len(), min_support = self.min_support, "insufficient evidence, refusing");
            return Ok(Answer::refusal(report));
        }
        let prompt = build_prompt(query, results);
        let text = self.generator.generate(&prompt, self.max_length).map_err(|e| match e {
            Error::ModelUnavailable { .. } => e,
            other => Error::model(Capability::Generation, other),
        })?;
        Ok(Answer { text, sources: results.sources(), refused: false, report })
    }
}
