//! The deprecation fact record.
//!
//! Field doc comments double as the per-field instructions in the schema the
//! generation call is constrained by, so they are written for the model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One deprecated API element, its replacement, and the question/answer
/// framing used to teach or test that change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeprecationFact {
    /// A brief name for the change or deprecation (e.g. 'Removal of
    /// array.tostring()').
    pub name: String,

    /// A natural user question that does not name the deprecated function,
    /// method or module and does not say anything is deprecated, removed or
    /// no longer allowed. It motivates the reason the functionality is needed,
    /// so that the answer is the function (e.g. 'How can I convert a NumPy
    /// array's data buffer into a standard Python bytes object?').
    pub question: String,

    /// An alternative phrasing of 'question' with different words and the same
    /// meaning and answer (e.g. 'What's the method to transform a NumPy
    /// array's data buffer into a standard Python bytes object?').
    #[serde(alias = "question_ver2")]
    pub question_variant: String,

    /// The deprecated approach named explicitly, up to one line of code,
    /// written in the present tense as the approach currently in use, never
    /// 'was used' or 'previously' (e.g. 'Use arr.tostring()').
    pub old_approach: String,

    /// The recommended replacement by name and its benefit, plain language,
    /// at most an inline reference to the code (e.g. 'arr.tobytes()').
    pub new_approach: String,

    /// The specific entity or technical term being changed. It MUST appear
    /// exactly, character for character, as a substring of 'question'.
    pub subject: String,

    /// A fill-in-the-blank lead-in whose natural completion is the new
    /// approach (e.g. 'To convert a NumPy array's data buffer into a standard
    /// Python bytes object use ').
    pub completion_prompt: String,
}

/// Why a fact is unusable downstream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactViolation {
    /// A field is empty or whitespace only.
    #[error("field '{0}' is empty")]
    EmptyField(&'static str),

    /// `subject` does not occur verbatim in `question`.
    #[error("subject '{subject}' does not appear in question")]
    SubjectNotInQuestion { subject: String },
}

impl DeprecationFact {
    /// Named fields in schema order.
    fn fields(&self) -> [(&'static str, &str); 7] {
        [
            ("name", &self.name),
            ("question", &self.question),
            ("question_variant", &self.question_variant),
            ("old_approach", &self.old_approach),
            ("new_approach", &self.new_approach),
            ("subject", &self.subject),
            ("completion_prompt", &self.completion_prompt),
        ]
    }

    /// Check that every field is non-empty and `subject` is a substring of
    /// `question`.
    pub fn validate(&self) -> Result<(), FactViolation> {
        if let Some((field, _)) = self.fields().into_iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(FactViolation::EmptyField(field));
        }

        if !self.question.contains(&self.subject) {
            return Err(FactViolation::SubjectNotInQuestion {
                subject: self.subject.clone(),
            });
        }

        Ok(())
    }
}
