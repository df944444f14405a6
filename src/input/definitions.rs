//! Extracts message definitions from JavaScript/TypeScript modules using Tree-sitter.
//!
//! ```js
//! export const meta = { secret: false, translate: true, translationsPath: 'messages' };
//! export default defineMessages({
//!   GREETING: 'Hello',
//!   COUNT: { message: '{count, plural, other {# items}}', description: 'Cart size' },
//! });
//! ```

use rustc_hash::FxHashSet;
use tree_sitter::{
    Language,
    Node,
    Parser,
    Query,
    QueryCursor,
    StreamingIteratorMut,
};

use super::{
    ParsedDefinitions,
    RawMessageDefinition,
    SourceError,
};
use crate::classify::SourceFileKind;
use crate::diagnostic::{
    Diagnostic,
    DiagnosticCode,
    DiagnosticSeverity,
};
use crate::messages::{
    MessageMeta,
    MessageValue,
    SourceFileMeta,
};
use crate::types::SourcePosition;

/// Name of the function wrapping a file's definitions.
pub const DEFINE_MESSAGES_FN: &str = "defineMessages";

/// Name of the exported file meta object.
pub const META_EXPORT_NAME: &str = "meta";

/// Pattern 0 finds the `defineMessages({...})` object, pattern 1 the `export const meta = {...}`
/// object. Declarations that aren't exported are ignored.
const DEFINITIONS_QUERY: &str = r"
(call_expression
  function: (identifier) @define_fn
  arguments: (arguments . (object) @messages))

(export_statement
  [
    (lexical_declaration
      (variable_declarator
        name: (identifier) @meta_name
        value: (object) @meta))
    (variable_declaration
      (variable_declarator
        name: (identifier) @meta_name
        value: (object) @meta))
  ])
";

/// A single message that couldn't be read.
#[derive(Debug)]
struct InvalidEntry {
    /// Where the problem is.
    position: SourcePosition,
    /// Human readable reason.
    reason: String,
}

impl InvalidEntry {
    /// Creates an error pointing at `node`.
    fn new(node: Node<'_>, reason: impl Into<String>) -> Self {
        Self { position: node.start_position().into(), reason: reason.into() }
    }
}

/// Picks the grammar for a definitions file from its extension.
fn language_for_path(path: &str) -> Language {
    if path.ends_with(".tsx") {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    } else if path.ends_with(".ts") {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    } else {
        tree_sitter_javascript::LANGUAGE.into()
    }
}

/// Parses a definitions file.
///
/// # Errors
/// Returns `SourceError` when the file is not valid syntax, has no `defineMessages` call, or
/// exports an invalid `meta`. Problems with individual messages are returned as diagnostics.
pub fn parse_definitions(file: &str, content: &str) -> Result<ParsedDefinitions, SourceError> {
    let language = language_for_path(file);
    let mut parser = Parser::new();
    parser.set_language(&language)?;
    let tree = parser.parse(content, None).ok_or_else(|| SourceError::Syntax {
        kind: SourceFileKind::Definitions,
        reason: "parser produced no syntax tree".to_string(),
    })?;
    let root = tree.root_node();

    if root.has_error() {
        let position: SourcePosition =
            first_error(root).map(|node| node.start_position().into()).unwrap_or_default();
        return Err(SourceError::Syntax {
            kind: SourceFileKind::Definitions,
            reason: format!("invalid syntax at {}:{}", position.line + 1, position.col + 1),
        });
    }

    let query = Query::new(&language, DEFINITIONS_QUERY).map_err(|error| SourceError::Syntax {
        kind: SourceFileKind::Definitions,
        reason: error.to_string(),
    })?;
    let source = content.as_bytes();
    let capture_names = query.capture_names();

    let mut messages_node = None;
    let mut meta_node = None;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, root, source);

    while let Some(query_match) = matches.next_mut() {
        let mut target = None;
        let mut name_matches = false;
        for capture in query_match.captures {
            let Some(capture_name) = capture_names.get(capture.index as usize) else {
                continue;
            };
            match *capture_name {
                "define_fn" => {
                    name_matches =
                        capture.node.utf8_text(source).is_ok_and(|text| text == DEFINE_MESSAGES_FN);
                }
                "meta_name" => {
                    name_matches =
                        capture.node.utf8_text(source).is_ok_and(|text| text == META_EXPORT_NAME);
                }
                _ => target = Some(capture.node),
            }
        }
        let (Some(node), true) = (target, name_matches) else {
            continue;
        };
        // 最初に見つかったものを採用する
        if query_match.pattern_index == 0 {
            messages_node.get_or_insert(node);
        } else {
            meta_node.get_or_insert(node);
        }
    }

    let meta = match meta_node {
        Some(node) => parse_meta(node, source, &SourceFileMeta::default())
            .map_err(SourceError::InvalidSourceFileMeta)?,
        None => SourceFileMeta::default(),
    };
    let messages_node = messages_node.ok_or(SourceError::NoDefinitions)?;

    let mut parsed = ParsedDefinitions { meta, ..ParsedDefinitions::default() };
    let mut seen = FxHashSet::default();

    for entry in messages_node.named_children(&mut messages_node.walk()) {
        match entry.kind() {
            "comment" => continue,
            "pair" => {}
            other => {
                parsed.diagnostics.push(invalid_message(
                    file,
                    None,
                    &InvalidEntry::new(entry, format!("Unsupported `{other}` in {DEFINE_MESSAGES_FN}")),
                ));
                continue;
            }
        }
        let (Some(key_node), Some(value_node)) =
            (entry.child_by_field_name("key"), entry.child_by_field_name("value"))
        else {
            continue;
        };
        let Some(name) = property_key(key_node, source) else {
            parsed.diagnostics.push(invalid_message(
                file,
                None,
                &InvalidEntry::new(key_node, "Message keys must be identifiers or string literals"),
            ));
            continue;
        };

        let position = SourcePosition::from(key_node.start_position());
        // 重複したキーは JS と同じく最後の宣言が値になり、順序は最初の宣言のもの
        let earlier = if seen.insert(name.clone()) {
            None
        } else {
            parsed.diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::DuplicateDefinition,
                    DiagnosticSeverity::Warning,
                    file,
                    position,
                    format!("`{name}` is declared more than once in this file"),
                )
                .with_key(&name)
                .with_help("Only the last declaration is used"),
            );
            parsed.messages.iter().position(|existing| existing.name == name)
        };

        match (read_definition(&name, position, value_node, source, &parsed.meta), earlier) {
            (Ok(definition), Some(index)) => {
                if let Some(slot) = parsed.messages.get_mut(index) {
                    *slot = definition;
                }
            }
            (Ok(definition), None) => parsed.messages.push(definition),
            (Err(error), earlier) => {
                if let Some(index) = earlier {
                    parsed.messages.remove(index);
                }
                parsed.diagnostics.push(invalid_message(file, Some(&name), &error));
            }
        }
    }

    tracing::debug!(
        file = %file,
        messages = parsed.messages.len(),
        diagnostics = parsed.diagnostics.len(),
        "Parsed definitions"
    );
    Ok(parsed)
}

/// Builds the diagnostic for a message that was skipped.
fn invalid_message(file: &str, name: Option<&str>, error: &InvalidEntry) -> Diagnostic {
    let diagnostic = Diagnostic::new(
        DiagnosticCode::InvalidMessage,
        DiagnosticSeverity::Error,
        file,
        error.position,
        error.reason.clone(),
    );
    match name {
        Some(name) => diagnostic.with_key(name),
        None => diagnostic,
    }
}

/// Reads one `KEY: value` entry. The value is a string or `{ message, description, meta }`.
fn read_definition(
    name: &str,
    position: SourcePosition,
    node: Node<'_>,
    source: &[u8],
    file_meta: &MessageMeta,
) -> Result<RawMessageDefinition, InvalidEntry> {
    let (body_node, description, meta) = if node.kind() == "object" {
        let mut body = None;
        let mut description = None;
        let mut meta = file_meta.clone();
        for field in node.named_children(&mut node.walk()) {
            if field.kind() != "pair" {
                continue;
            }
            let (Some(key), Some(value)) =
                (field.child_by_field_name("key"), field.child_by_field_name("value"))
            else {
                continue;
            };
            match property_key(key, source).as_deref() {
                Some("message") => body = Some(value),
                Some("description") => description = Some(read_string(value, source)?),
                Some("meta") => {
                    meta = parse_meta(value, source, file_meta).map_err(|reason| {
                        InvalidEntry::new(value, format!("Message meta for `{name}` is invalid: {reason}"))
                    })?;
                }
                _ => {}
            }
        }
        let body = body.ok_or_else(|| {
            InvalidEntry::new(node, format!("Message `{name}` did not contain a message value"))
        })?;
        (body, description, meta)
    } else {
        (node, None, file_meta.clone())
    };

    let raw = read_string(body_node, source)?;
    let value = MessageValue::from_raw(&raw)
        .map_err(|error| InvalidEntry::new(body_node, format!("Invalid message body: {error}")))?
        .with_file_position(body_node.start_position().into());

    Ok(RawMessageDefinition { name: name.to_string(), value, position, meta, description })
}

/// Reads a property name: identifiers, numbers and string literals.
fn property_key(node: Node<'_>, source: &[u8]) -> Option<String> {
    let text = node.utf8_text(source).ok()?;
    match node.kind() {
        "property_identifier" | "identifier" | "number" => Some(text.to_string()),
        "string" => Some(unescape_js(strip_delimiters(text))),
        _ => None,
    }
}

/// Reads a string literal or a template literal without substitutions.
fn read_string(node: Node<'_>, source: &[u8]) -> Result<String, InvalidEntry> {
    let text = node
        .utf8_text(source)
        .map_err(|_| InvalidEntry::new(node, "String is not valid UTF-8"))?;
    match node.kind() {
        "string" => Ok(unescape_js(strip_delimiters(text))),
        "template_string" => {
            let has_substitution = node
                .named_children(&mut node.walk())
                .any(|child| child.kind() == "template_substitution");
            if has_substitution {
                return Err(InvalidEntry::new(
                    node,
                    "Template strings with substitutions are not allowed in messages",
                ));
            }
            Ok(unescape_js(strip_delimiters(text)))
        }
        other => Err(InvalidEntry::new(node, format!("Expected a string, found `{other}`"))),
    }
}

/// Reads `true` / `false`.
fn read_bool(node: Node<'_>) -> Result<bool, String> {
    match node.kind() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("expected a boolean, found `{other}`")),
    }
}

/// Parses a meta object literal on top of `base`.
fn parse_meta(node: Node<'_>, source: &[u8], base: &MessageMeta) -> Result<MessageMeta, String> {
    if node.kind() != "object" {
        return Err("meta must be an object literal".to_string());
    }
    let mut meta = base.clone();
    for field in node.named_children(&mut node.walk()) {
        match field.kind() {
            "comment" => continue,
            "pair" => {}
            other => return Err(format!("unsupported `{other}` in meta")),
        }
        let (Some(key), Some(value)) =
            (field.child_by_field_name("key"), field.child_by_field_name("value"))
        else {
            continue;
        };
        match property_key(key, source).as_deref() {
            Some("secret") => meta.secret = read_bool(value)?,
            Some("translate") => meta.translate = read_bool(value)?,
            Some("translationsPath") => {
                meta.translations_path =
                    read_string(value, source).map_err(|error| error.reason)?;
            }
            Some(other) => return Err(format!("unknown meta property `{other}`")),
            None => return Err("meta keys must be identifiers or string literals".to_string()),
        }
    }
    Ok(meta)
}

/// Finds the first error or missing node below `node`.
fn first_error<'tree>(node: Node<'tree>) -> Option<Node<'tree>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).filter(Node::has_error).collect();
    children.into_iter().find_map(first_error)
}

/// Removes the surrounding quotes or backticks of a literal.
fn strip_delimiters(text: &str) -> &str {
    text.get(1..text.len().saturating_sub(1)).unwrap_or_default()
}

/// Appends the character for a hexadecimal code point, or U+FFFD if it isn't one.
fn push_code_point(out: &mut String, hex: &str) {
    let c = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    out.push(c.unwrap_or(char::REPLACEMENT_CHARACTER));
}

/// Evaluates JavaScript string escapes.
fn unescape_js(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, &hex);
            }
            'u' => {
                let hex: String = if chars.next_if_eq(&'{').is_some() {
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                push_code_point(&mut out, &hex);
            }
            // 行継続
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }
    out
}
