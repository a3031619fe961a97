use std::path::Path;

use crate::errors::HarnessError;

/// Labelled block of text prepended to the first prompt of a session.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContextItem {
    /// Short name shown to the model (usually a file path).
    pub label: String,
    pub body: String,
}

impl ContextItem {
    pub fn new(label: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            body: body.into(),
        }
    }

    /// Loads a UTF-8 file, labelled with the path as given.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string(), body))
    }
}

/// Builds the prompt sent to a vendor: each context item in a
/// `<context label="...">` block, then the message.
///
/// With no context the message is returned unchanged.
pub fn build_prompt(context: &[ContextItem], message: &str) -> String {
    if context.is_empty() {
        return message.to_string();
    }
    let mut prompt = String::new();
    for item in context {
        prompt.push_str("<context label=\"");
        prompt.push_str(&item.label);
        prompt.push_str("\">\n");
        prompt.push_str(item.body.trim_end());
        prompt.push_str("\n</context>\n\n");
    }
    prompt.push_str(message);
    prompt
}
