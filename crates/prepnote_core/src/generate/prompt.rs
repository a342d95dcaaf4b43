//! Generation request model and prompt assembly.

use crate::model::saved::{NoteFormat, NoteMetadata, NoteTheme};

/// Fixed system instruction sent with every generation request.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert interview coach who writes clear, \
well-structured study notes. Respond with HTML only, using <h1>-<h3>, <p>, <ul>, <ol>, <li>, \
<strong> and <em>. Start definitions with \"Definition:\" and examples with \"Example:\". \
Do not include <html>, <head> or <body> tags.";

/// Requested note length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteLength {
    Short,
    Medium,
    Long,
}

impl NoteLength {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }

    fn word_target(self) -> u32 {
        match self {
            Self::Short => 300,
            Self::Medium => 600,
            Self::Long => 1000,
        }
    }
}

/// Audience level the notes are written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

/// Parameters of one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: String,
    pub format: NoteFormat,
    pub length: NoteLength,
    pub difficulty: Difficulty,
    pub include_examples: bool,
    pub include_summary: bool,
}

impl GenerationRequest {
    /// Metadata to store next to notes produced by this request.
    pub fn metadata(&self, theme: Option<NoteTheme>) -> NoteMetadata {
        NoteMetadata {
            format: Some(self.format),
            theme,
            topic: Some(self.topic.trim().to_string()),
        }
    }
}

fn format_instruction(format: NoteFormat) -> &'static str {
    match format {
        NoteFormat::Structured => {
            "Organize the notes into titled sections with short explanatory paragraphs."
        }
        NoteFormat::Bullet => "Write the notes as concise bullet points grouped under headings.",
        NoteFormat::Outline => "Write the notes as a hierarchical outline of numbered points.",
        NoteFormat::Flashcard => {
            "Write the notes as question and answer pairs, one pair per paragraph."
        }
    }
}

/// Builds the user prompt for `request`.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let mut lines = vec![
        format!(
            "Create {} {} study notes about \"{}\".",
            request.length.as_str(),
            request.difficulty.as_str(),
            request.topic.trim()
        ),
        format_instruction(request.format).to_string(),
        format!(
            "Aim for about {} words.",
            request.length.word_target()
        ),
    ];
    if request.include_examples {
        lines.push("Include practical examples that could come up in an interview.".to_string());
    }
    if request.include_summary {
        lines.push("End with a short summary section of the key takeaways.".to_string());
    }
    lines.join("\n")
}
