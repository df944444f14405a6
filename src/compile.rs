//! Compiled per-locale artifacts.
//!
//! A compiled file maps each message of a source file to its body in one locale. Bodies that
//! are plain text compile to a string. Anything else compiles to an array of nodes tagged with
//! FormatJS element numbers:
//!
//! | tag | node       | shape                                   |
//! |-----|------------|-----------------------------------------|
//! | 1   | argument   | `[1, name]`                             |
//! | 2   | number     | `[2, name, style?]`                     |
//! | 3   | date       | `[3, name, style?]`                     |
//! | 4   | time       | `[4, name, style?]`                     |
//! | 5   | select     | `[5, name, {selector: nodes}]`          |
//! | 6   | plural     | `[6, name, {selector: nodes}, offset, "cardinal" or "ordinal"]` |
//! | 7   | pound      | `[7]`                                   |
//! | 8   | tag        | `[8, name, nodes, destination?]`        |
//!
//! Literal text inside an array is a plain string.

use std::path::Path;

use indexmap::IndexMap;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Value,
    json,
};

use crate::classify::normalize_locale;
use crate::database::MessagesDatabase;
use crate::error::{
    DatabaseError,
    DatabaseResult,
    NotFoundKind,
};
use crate::messages::ast::{
    Arm,
    Document,
    Icu,
    LinkDestination,
    Node,
    PluralKind,
};
use crate::messages::{
    Message,
    MessageValue,
};

/// Tag of an argument node.
const ARGUMENT_TAG: u8 = 1;
/// Tag of a number node.
const NUMBER_TAG: u8 = 2;
/// Tag of a date node.
const DATE_TAG: u8 = 3;
/// Tag of a time node.
const TIME_TAG: u8 = 4;
/// Tag of a select node.
const SELECT_TAG: u8 = 5;
/// Tag of a plural node.
const PLURAL_TAG: u8 = 6;
/// Tag of a pound node.
const POUND_TAG: u8 = 7;
/// Tag of a tag (hook, link, strong, code) node.
const TAG_TAG: u8 = 8;

/// Tag name used for `**strong**` text.
pub const STRONG_TAG_NAME: &str = "b";
/// Tag name used for code spans.
pub const CODE_TAG_NAME: &str = "code";
/// Tag name used for links.
pub const LINK_TAG_NAME: &str = "link";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompileFormat {
    /// An object of hashed key to compiled body, in file order.
    #[default]
    Json,
    /// An array of compiled bodies in file order. Excluded messages are `null`.
    KeylessJson,
}

/// What to do when the requested locale has no translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackPolicy {
    /// Use the source-locale body of the active definition.
    #[default]
    SourceLocale,
    /// Fail with `MissingResolvableBody`.
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    pub format: CompileFormat,
    /// Include messages marked `secret`.
    pub bundle_secrets: bool,
    pub fallback: FallbackPolicy,
}

impl MessagesDatabase {
    /// Compiles every message of `path` in `locale`.
    ///
    /// # Errors
    /// `NotFound` if the path was never ingested, `MissingResolvableBody` if a message has no
    /// body under the fallback policy.
    pub fn precompile(
        &self,
        path: &str,
        locale: &str,
        options: &CompileOptions,
    ) -> DatabaseResult<Vec<u8>> {
        let state = self.read_state();
        let source = state
            .sources
            .get(path)
            .ok_or_else(|| DatabaseError::NotFound(NotFoundKind::SourceFile(path.to_string())))?;
        let locale = normalize_locale(locale);

        let mut compiled = Vec::with_capacity(source.message_keys.len());
        for message in state.file_messages(source) {
            if message.meta().secret && !options.bundle_secrets {
                compiled.push((message, None));
                continue;
            }
            let value = resolve_value(message, &locale, options.fallback).ok_or_else(|| {
                DatabaseError::MissingResolvableBody {
                    file: path.to_string(),
                    key: message.key().to_string(),
                    locale: locale.clone(),
                }
            })?;
            compiled.push((message, Some(compile_document(&value.parsed))));
        }
        tracing::debug!(file = %path, %locale, messages = compiled.len(), "Compiled messages");

        let bytes = match options.format {
            CompileFormat::Json => {
                let object: IndexMap<&str, Value> = compiled
                    .into_iter()
                    .filter_map(|(message, value)| Some((message.hashed_key().as_str(), value?)))
                    .collect();
                serde_json::to_vec(&object)?
            }
            CompileFormat::KeylessJson => {
                let values: Vec<Value> = compiled
                    .into_iter()
                    .map(|(_, value)| value.unwrap_or(Value::Null))
                    .collect();
                serde_json::to_vec(&values)?
            }
        };
        Ok(bytes)
    }

    /// Compiles `path` in `locale` and writes the result to `output`, creating parent
    /// directories as needed.
    ///
    /// # Errors
    /// Everything [`Self::precompile`] returns, plus `Io` if the file can't be written.
    pub fn precompile_to_path(
        &self,
        path: &str,
        locale: &str,
        output: &Path,
        options: &CompileOptions,
    ) -> DatabaseResult<()> {
        let bytes = self.precompile(path, locale, options)?;
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, bytes)?;
        tracing::debug!(file = %path, output = %output.display(), "Wrote compiled messages");
        Ok(())
    }
}

/// Picks the body to compile for `locale`.
fn resolve_value<'a>(
    message: &'a Message,
    locale: &str,
    fallback: FallbackPolicy,
) -> Option<&'a MessageValue> {
    if let Some(translation) = message.translation(locale) {
        return Some(&translation.value);
    }
    match fallback {
        FallbackPolicy::SourceLocale => message.source_value(),
        FallbackPolicy::Strict => None,
    }
}

/// Compiles a parsed body: a string when it is plain text, an array of nodes otherwise.
#[must_use]
pub fn compile_document(document: &Document) -> Value {
    document.as_plain_text().map_or_else(|| compile_nodes(document.nodes()), Value::String)
}

/// Compiles a list of nodes, merging adjacent text.
fn compile_nodes(nodes: &[Node]) -> Value {
    let mut compiled = Vec::with_capacity(nodes.len());
    let mut text = String::new();
    for node in nodes {
        if let Node::Text(part) = node {
            text.push_str(part);
            continue;
        }
        if !text.is_empty() {
            compiled.push(Value::String(std::mem::take(&mut text)));
        }
        compiled.push(compile_node(node));
    }
    if !text.is_empty() {
        compiled.push(Value::String(text));
    }
    Value::Array(compiled)
}

/// Compiles one non-text node.
fn compile_node(node: &Node) -> Value {
    match node {
        Node::Text(text) => Value::String(text.clone()),
        Node::Pound => json!([POUND_TAG]),
        Node::Icu(icu) => compile_icu(icu),
        Node::Hook { name, content } => json!([TAG_TAG, name, compile_nodes(content)]),
        Node::Strong(content) => json!([TAG_TAG, STRONG_TAG_NAME, compile_nodes(content)]),
        Node::Code(code) => json!([TAG_TAG, CODE_TAG_NAME, [code]]),
        Node::Link { label, destination } => {
            let destination = match destination {
                LinkDestination::Url(url) => Value::String(url.clone()),
                LinkDestination::Placeholder(icu) => compile_icu(icu),
            };
            json!([TAG_TAG, LINK_TAG_NAME, compile_nodes(label), destination])
        }
    }
}

/// Compiles a placeholder.
fn compile_icu(icu: &Icu) -> Value {
    match icu {
        Icu::Argument { name } => json!([ARGUMENT_TAG, name]),
        Icu::Number { name, style } => styled(NUMBER_TAG, name, style.as_deref()),
        Icu::Date { name, style } => styled(DATE_TAG, name, style.as_deref()),
        Icu::Time { name, style } => styled(TIME_TAG, name, style.as_deref()),
        Icu::Select { name, arms } => json!([SELECT_TAG, name, compile_arms(arms)]),
        Icu::Plural { name, kind, offset, arms } => {
            let kind = match kind {
                PluralKind::Cardinal => "cardinal",
                PluralKind::Ordinal => "ordinal",
            };
            json!([PLURAL_TAG, name, compile_arms(arms), offset, kind])
        }
    }
}

/// `[tag, name]`, with the style appended when there is one.
fn styled(tag: u8, name: &str, style: Option<&str>) -> Value {
    style.map_or_else(|| json!([tag, name]), |style| json!([tag, name, style]))
}

/// Compiles plural or select arms into an object keyed by selector.
fn compile_arms(arms: &[Arm]) -> Value {
    let arms: IndexMap<&str, Value> =
        arms.iter().map(|arm| (arm.selector.as_str(), compile_nodes(&arm.content))).collect();
    json!(arms)
}
