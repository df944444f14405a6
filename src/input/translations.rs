//! Translations files: JSON objects mapping original keys to message bodies.
//!
//! Values are read with `jsonc_parser` so comments and trailing commas are accepted; Tree-sitter
//! supplies the order and source positions of the entries.

use jsonc_parser::ParseOptions;
use rustc_hash::{
    FxHashMap,
    FxHashSet,
};
use serde_json::Value;

use super::{
    ParsedTranslations,
    RawMessageTranslation,
    SourceError,
};
use crate::classify::SourceFileKind;
use crate::diagnostic::{
    Diagnostic,
    DiagnosticCode,
    DiagnosticSeverity,
};
use crate::messages::MessageValue;
use crate::types::SourcePosition;

/// Positions of a top-level entry.
#[derive(Debug, Clone, Copy)]
struct EntryPosition {
    /// Start of the key.
    key: SourcePosition,
    /// Start of the value.
    value: SourcePosition,
}

/// Parses a translations file.
///
/// # Errors
/// Returns `SourceError` if the content is not JSON or its root is not an object. Values that
/// are not strings or not valid message bodies are reported as diagnostics.
pub fn parse_translations(file: &str, content: &str) -> Result<ParsedTranslations, SourceError> {
    let root = jsonc_parser::parse_to_serde_value(content, &ParseOptions::default())
        .map_err(|error| SourceError::Syntax {
            kind: SourceFileKind::Translations,
            reason: error.to_string(),
        })?;
    let Some(Value::Object(entries)) = root else {
        return Err(SourceError::RootNotObject);
    };

    let (order, positions) = extract_entry_positions(content);
    let mut seen = FxHashSet::default();
    let keys = order
        .iter()
        .map(String::as_str)
        .chain(entries.keys().map(String::as_str))
        .filter(|key| entries.contains_key(*key) && seen.insert(*key));

    let mut parsed = ParsedTranslations::default();
    for key in keys {
        let Some(value) = entries.get(key) else {
            continue;
        };
        let position = positions.get(key).copied();
        let key_position = position.map(|p| p.key).unwrap_or_default();
        let value_position = position.map(|p| p.value).unwrap_or_default();

        let Value::String(raw) = value else {
            parsed.diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::InvalidMessage,
                    DiagnosticSeverity::Error,
                    file,
                    value_position,
                    format!("Translation for `{key}` must be a string"),
                )
                .with_key(key),
            );
            continue;
        };

        match MessageValue::from_raw(raw) {
            Ok(value) => parsed.messages.push(RawMessageTranslation {
                name: key.to_string(),
                value: value.with_file_position(value_position),
                position: key_position,
            }),
            Err(error) => parsed.diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::InvalidMessage,
                    DiagnosticSeverity::Error,
                    file,
                    value_position,
                    format!("Invalid message body: {error}"),
                )
                .with_key(key),
            ),
        }
    }

    tracing::debug!(
        file = %file,
        messages = parsed.messages.len(),
        diagnostics = parsed.diagnostics.len(),
        "Parsed translations"
    );
    Ok(parsed)
}

/// Returns the top-level keys in file order with their positions.
///
/// Positions are best effort: content Tree-sitter can't fully parse still yields the entries
/// it could recover.
fn extract_entry_positions(content: &str) -> (Vec<String>, FxHashMap<String, EntryPosition>) {
    let mut order = Vec::new();
    let mut positions = FxHashMap::default();

    let mut parser = tree_sitter::Parser::new();
    let Ok(()) = parser.set_language(&tree_sitter_json::LANGUAGE.into()) else {
        tracing::warn!("Failed to set tree-sitter-json language");
        return (order, positions);
    };
    let Some(tree) = parser.parse(content, None) else {
        tracing::warn!("Failed to parse JSON with tree-sitter");
        return (order, positions);
    };

    let source = content.as_bytes();
    let root = tree.root_node();
    let Some(object) =
        root.named_children(&mut root.walk()).find(|node| node.kind() == "object")
    else {
        return (order, positions);
    };

    for pair in object.named_children(&mut object.walk()) {
        if pair.kind() != "pair" {
            continue;
        }
        let (Some(key_node), Some(value_node)) =
            (pair.child_by_field_name("key"), pair.child_by_field_name("value"))
        else {
            continue;
        };
        let Ok(key_text) = key_node.utf8_text(source) else {
            continue;
        };
        let key = serde_json::from_str::<String>(key_text)
            .unwrap_or_else(|_| key_text.trim_matches('"').to_string());

        positions.entry(key.clone()).or_insert(EntryPosition {
            key: key_node.start_position().into(),
            value: value_node.start_position().into(),
        });
        order.push(key);
    }

    (order, positions)
}
