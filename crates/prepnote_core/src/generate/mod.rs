//! Note generation adapter.
//!
//! # Responsibility
//! - Describe generation requests and build the prompt sent to a generator.
//! - Normalize raw generator output into a document.
//! - Route results through an editor session so only the latest request lands.
//!
//! # Invariants
//! - The generator backend is an injected trait object; no network client
//!   lives in core.
//! - Failures never mutate the session document.

use crate::editor::session::{EditorSession, RequestOutcome};
use crate::model::document::Document;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

mod normalize;
mod prompt;

pub use normalize::{mark_callouts, normalize_response, wrap_paragraphs};
pub use prompt::{build_prompt, Difficulty, GenerationRequest, NoteLength, SYSTEM_INSTRUCTION};

/// Generation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Backend could not be reached or rejected the request.
    RequestError(String),
    /// Backend answered without usable text.
    EmptyResponse,
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestError(message) => write!(f, "generation request failed: {message}"),
            Self::EmptyResponse => write!(f, "generator returned no content"),
        }
    }
}

impl Error for GenerationError {}

/// Text generation backend.
pub trait NoteGenerator {
    /// Returns raw markup or plain text for `prompt`.
    fn generate(&self, system_instruction: &str, prompt: &str) -> Result<String, GenerationError>;
}

/// Runs one request against `generator` and returns the normalized document.
///
/// # Errors
/// - `RequestError` for a blank topic or a backend failure.
/// - `EmptyResponse` when the backend returns no visible text.
pub fn generate_document<G>(
    generator: &G,
    request: &GenerationRequest,
) -> Result<Document, GenerationError>
where
    G: NoteGenerator + ?Sized,
{
    if request.topic.trim().is_empty() {
        return Err(GenerationError::RequestError(
            "topic cannot be blank".to_string(),
        ));
    }

    let started_at = Instant::now();
    info!(
        "event=generate module=generate status=start format={} length={} difficulty={}",
        request.format.as_str(),
        request.length.as_str(),
        request.difficulty.as_str()
    );

    let result = generator
        .generate(SYSTEM_INSTRUCTION, &build_prompt(request))
        .and_then(|raw| normalize_response(&raw));

    match &result {
        Ok(document) => info!(
            "event=generate module=generate status=ok duration_ms={} blocks={}",
            started_at.elapsed().as_millis(),
            document.blocks().len()
        ),
        Err(err) => warn!(
            "event=generate module=generate status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

/// Generates into `session`, replacing its document on success.
///
/// The session's request fence decides whether the result still applies.
pub fn generate_into<G>(
    session: &mut EditorSession,
    generator: &G,
    request: &GenerationRequest,
) -> RequestOutcome<GenerationError>
where
    G: NoteGenerator + ?Sized,
{
    let token = session.begin_request();
    let result = generate_document(generator, request);
    session.complete_request(token, result)
}
