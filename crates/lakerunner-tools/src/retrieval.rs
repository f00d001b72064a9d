//! Retrieval-augmented QA tools.
//!
//! Retrieval and answer synthesis are both collaborator traits: this crate
//! owns neither the vector store nor the language model. The QA tools wire
//! the two together and shape the result — plain answer text, or a
//! structured answer with source attribution.
//!
//! These are the context-shaped tools: caller-supplied per-call state rides
//! through [`RunContext`] to the synthesizer untouched. Its internal
//! structure is whatever the caller and synthesizer agree on; nothing here
//! inspects it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lakerunner_core::{
    ArgsSchema, BuildError, ContextToolHandler, FieldSpec, JsonMap, Observation, RunContext,
    ToolArgs, ToolError, ToolRunner,
};

/// One retrieved document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    /// Where the document came from, when the store knows.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub metadata: JsonMap,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: None,
            metadata: JsonMap::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Collaborator interface to the document store.
pub trait Retriever: Send + Sync {
    /// Fetch the `top_k` documents most relevant to the query.
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Document>, RetrievalError>;
}

/// Collaborator that turns a question plus supporting documents into an
/// answer.
///
/// `state` is the opaque per-call context the caller supplied, forwarded
/// as-is.
pub trait AnswerSynthesizer: Send + Sync {
    fn answer(
        &self,
        question: &str,
        documents: &[Document],
        state: Option<&[JsonMap]>,
    ) -> Result<String, RetrievalError>;
}

/// Failures reported by retrieval collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetrievalError {
    #[error("retrieval backend error: {message}")]
    Backend { message: String },
    #[error("synthesis failed: {message}")]
    Synthesis { message: String },
}

impl From<RetrievalError> for ToolError {
    fn from(err: RetrievalError) -> Self {
        ToolError::new(err.to_string())
    }
}

/// Default number of documents fetched per question.
pub const DEFAULT_TOP_K: usize = 4;

fn question_schema() -> ArgsSchema {
    ArgsSchema::new()
        .with_field(FieldSpec::text("query").with_description("a fully formed question"))
}

/// Answers a question from retrieved documents.
pub struct RetrievalQaTool {
    retriever: Arc<dyn Retriever>,
    synthesizer: Arc<dyn AnswerSynthesizer>,
    top_k: usize,
}

impl RetrievalQaTool {
    pub const NAME: &str = "retrieval_qa";

    const DESCRIPTION: &str = "Retrieves documents relevant to the question and answers \
         it from them. Input should be a fully formed question.";

    pub fn new(retriever: Arc<dyn Retriever>, synthesizer: Arc<dyn AnswerSynthesizer>) -> Self {
        Self {
            retriever,
            synthesizer,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn into_runner(self) -> Result<ToolRunner, BuildError> {
        Ok(ToolRunner::builder(Self::NAME, Self::DESCRIPTION)?
            .schema(question_schema())
            .context_handler(self)
            .build()?)
    }
}

impl ContextToolHandler for RetrievalQaTool {
    fn run(&self, args: ToolArgs, ctx: &RunContext<'_>) -> Result<Observation, ToolError> {
        let question = args
            .text_or("query")
            .ok_or_else(|| ToolError::new("no question given"))?;
        let documents = self.retriever.retrieve(question, self.top_k)?;
        let answer = self
            .synthesizer
            .answer(question, &documents, ctx.state())?;
        Ok(Observation::Text(answer))
    }
}

/// Answers a question and reports which sources the answer came from.
///
/// The observation is structured JSON: `{"answer": ..., "sources": [...]}`.
pub struct RetrievalQaSourcesTool {
    retriever: Arc<dyn Retriever>,
    synthesizer: Arc<dyn AnswerSynthesizer>,
    top_k: usize,
}

impl RetrievalQaSourcesTool {
    pub const NAME: &str = "retrieval_qa_sources";

    const DESCRIPTION: &str = "Retrieves documents relevant to the question and answers \
         it from them, returning the answer together with the sources used. Input should be a \
         fully formed question.";

    pub fn new(retriever: Arc<dyn Retriever>, synthesizer: Arc<dyn AnswerSynthesizer>) -> Self {
        Self {
            retriever,
            synthesizer,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn into_runner(self) -> Result<ToolRunner, BuildError> {
        Ok(ToolRunner::builder(Self::NAME, Self::DESCRIPTION)?
            .schema(question_schema())
            .context_handler(self)
            .build()?)
    }
}

impl ContextToolHandler for RetrievalQaSourcesTool {
    fn run(&self, args: ToolArgs, ctx: &RunContext<'_>) -> Result<Observation, ToolError> {
        let question = args
            .text_or("query")
            .ok_or_else(|| ToolError::new("no question given"))?;
        let documents = self.retriever.retrieve(question, self.top_k)?;
        let answer = self
            .synthesizer
            .answer(question, &documents, ctx.state())?;

        let mut sources: Vec<String> = Vec::new();
        for document in &documents {
            if let Some(source) = &document.source {
                if !sources.contains(source) {
                    sources.push(source.clone());
                }
            }
        }
        Ok(Observation::Json(serde_json::json!({
            "answer": answer,
            "sources": sources,
        })))
    }
}
