use serde::Serialize;

use super::ast::Document;
use super::parse::{
    BodyParseError,
    parse_message_body,
};
use super::variables::MessageVariables;
use crate::types::SourcePosition;

/// A message body: the raw text plus everything derived from it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageValue {
    pub raw: String,
    pub parsed: Document,
    pub variables: MessageVariables,
    /// Where the body starts in its source file.
    pub file_position: Option<SourcePosition>,
}

impl MessageValue {
    /// Parses `content` and collects its variables.
    pub fn from_raw(content: &str) -> Result<Self, BodyParseError> {
        let parsed = parse_message_body(content)?;
        let variables = MessageVariables::from_document(&parsed);
        Ok(Self { raw: content.to_string(), parsed, variables, file_position: None })
    }

    #[must_use]
    pub const fn with_file_position(mut self, position: SourcePosition) -> Self {
        self.file_position = Some(position);
        self
    }

    /// Position of the body, or the start of the file when unknown.
    #[must_use]
    pub fn position(&self) -> SourcePosition {
        self.file_position.unwrap_or_default()
    }
}

// Everything except the raw text is derived from it.
impl PartialEq for MessageValue {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for MessageValue {}
