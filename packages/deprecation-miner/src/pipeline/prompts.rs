//! Prompts for the extraction stage.

/// Instruction prologue for extracting deprecation facts from release notes.
///
/// Sent ahead of the release-note text. The output schema enforces shape;
/// these instructions carry the quality rules the schema cannot express.
pub const EXTRACT_DEPRECATIONS_PROMPT: &str = r#"Analyze the following release notes and extract the most important knowledge-focused question/answer objects describing API changes and deprecations.

Only include changes that affect common code. Skip changes with no material effect on typical usage (internal refactors, build tooling, typo fixes).

Every object must satisfy these rules:

1. question: a natural user question that does NOT name the deprecated function, method or module, and does NOT say that anything is deprecated, removed, or no longer allowed. Ask how to achieve the goal, motivating why the functionality is needed, so that the answer is the function. Do not include runnable code. Example: "How can I convert a NumPy array's data buffer into a standard Python bytes object?"
2. question_variant: a different phrasing of question with the same meaning and the same answer. Example: "What's the method to transform a NumPy array's data buffer into a standard Python bytes object?"
3. old_approach: the deprecated approach, naming the deprecated function or construct (at most one line of code). Write it in the PRESENT tense, as the approach currently in use. Never write "was used", "is used", "previously" or "deprecated". Example: "Use arr.tostring()"
4. new_approach: the recommended replacement by name and its benefit, in plain language, with at most an inline code reference and no code blocks. Example: "arr.tobytes()"
5. subject: the specific technical entity or term the question is about. It MUST appear exactly, character for character, inside question.
6. completion_prompt: a lead-in sentence whose natural completion is the new approach. Example: "To convert a NumPy array's data buffer into a standard Python bytes object use "
7. name: a brief label for the change. Example: "Removal of ndarray.tostring()"

Output a JSON array of these objects and nothing else. An empty array is a valid answer when nothing qualifies.

Release notes:"#;
