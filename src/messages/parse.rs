//! Parser for message bodies.
//!
//! Supports ICU placeholders (`{name}`, `{n, number}`, `{d, date}`, `{t, time}`,
//! `{n, plural, ...}`, `{n, selectordinal, ...}`, `{v, select, ...}`), `#` inside plural
//! branches, hooks (`$[label](hookName)`), links (`[label](url)` / `[label]({url})`),
//! `**strong**`, and `` `code` `` spans. A backslash escapes ASCII punctuation.
//!
//! Links and hooks don't nest, and strong text doesn't nest. Every inline construct is
//! attempted at most once per offset, so unmatched openers cost linear time.

use rustc_hash::FxHashSet;
use thiserror::Error;

use super::ast::{
    Arm,
    Document,
    Icu,
    LinkDestination,
    Node,
    PluralKind,
};

/// Deepest placeholder nesting accepted.
pub const MAX_NESTING_DEPTH: usize = 32;

/// The specific problem found in a message body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyErrorKind {
    #[error("placeholder is not closed")]
    UnclosedPlaceholder,
    #[error("unexpected `}}` outside of a placeholder")]
    UnmatchedCloseBrace,
    #[error("placeholder name is missing or invalid")]
    InvalidPlaceholderName,
    #[error("expected `,` or `}}` after the placeholder name")]
    ExpectedPlaceholderEnd,
    #[error("placeholder type is missing")]
    MissingArgumentType,
    #[error("unknown placeholder type `{0}`")]
    UnknownArgumentType(String),
    #[error("plural offset must be a non-negative integer")]
    InvalidOffset,
    #[error("`{0}` has no branches")]
    MissingArms(String),
    #[error("`{0}` is missing the required `other` branch")]
    MissingOtherArm(String),
    #[error("branch selector is missing")]
    EmptyArmSelector,
    #[error("expected `{{` to start the `{0}` branch")]
    ExpectedArmContent(String),
    #[error("formatting is not terminated")]
    Unterminated,
    #[error("placeholders are nested more than {MAX_NESTING_DEPTH} levels deep")]
    TooDeeplyNested,
}

/// Error returned when a message body cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (at byte {offset})")]
pub struct BodyParseError {
    pub kind: BodyErrorKind,
    /// Byte offset into the message body.
    pub offset: usize,
}

/// Parses a raw message body.
///
/// # Examples
/// ```
/// use intl_message_db::messages::parse::parse_message_body;
///
/// let document = parse_message_body("Hello, {name}!").unwrap();
/// assert_eq!(document.nodes().len(), 3);
/// ```
pub fn parse_message_body(source: &str) -> Result<Document, BodyParseError> {
    let mut parser = BodyParser {
        source,
        pos: 0,
        depth: 0,
        failed_inlines: FxHashSet::default(),
        label_openers: Vec::new(),
    };
    let nodes = parser.parse_nodes(Stop::End, Context::default())?;
    Ok(Document::new(nodes))
}

/// What ends the sequence currently being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// End of input.
    End,
    /// `}` closing a plural/select branch.
    ArmEnd,
    /// `]` closing a hook or link label.
    LinkLabel,
    /// `**` closing strong text.
    Strong,
}

/// Constructs enclosing the current position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
struct Context {
    /// Inside a plural branch, where `#` stands for the plural value.
    in_plural: bool,
    /// Inside a hook or link label.
    in_label: bool,
    /// Inside strong text.
    in_strong: bool,
}

/// Inline constructs that fall back to literal text when they don't parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Inline {
    Hook,
    Link,
    Strong,
    Code,
}

/// Recursive descent parser over a message body.
struct BodyParser<'a> {
    /// Complete body text.
    source: &'a str,
    /// Current byte offset.
    pos: usize,
    /// Number of placeholders currently open.
    depth: usize,
    /// Inline constructs known not to parse, by start offset and context.
    failed_inlines: FxHashSet<(usize, Inline, Context)>,
    /// Offsets of the literal `[` found directly in the label being parsed.
    label_openers: Vec<usize>,
}

/// Moves pending text into the node list.
fn flush_text(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text(std::mem::take(text)));
    }
}

/// Characters allowed in placeholder names.
fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

impl<'a> BodyParser<'a> {
    /// Unconsumed input.
    fn rest(&self) -> &'a str {
        self.source.get(self.pos..).unwrap_or_default()
    }

    /// Next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Whether the unconsumed input starts with `prefix`.
    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Consumes one character.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consumes `prefix` if present.
    fn eat(&mut self, prefix: &str) -> bool {
        if self.starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Consumes characters while `predicate` holds and returns them.
    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&predicate) {
            self.bump();
        }
        self.source.get(start..self.pos).unwrap_or_default()
    }

    /// Consumes whitespace.
    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    /// Builds an error at the current offset.
    const fn error(&self, kind: BodyErrorKind) -> BodyParseError {
        BodyParseError { kind, offset: self.pos }
    }

    /// Whether the current position ends a sequence of the given kind.
    fn at_stop(&self, stop: Stop) -> bool {
        match stop {
            Stop::End => false,
            Stop::ArmEnd => self.starts_with("}"),
            Stop::LinkLabel => self.starts_with("]"),
            Stop::Strong => self.starts_with("**"),
        }
    }

    /// Parses nodes until `stop` (or end of input for [`Stop::End`]).
    fn parse_nodes(&mut self, stop: Stop, ctx: Context) -> Result<Vec<Node>, BodyParseError> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        while let Some(c) = self.peek() {
            if self.at_stop(stop) {
                break;
            }
            match c {
                '\\' => {
                    self.bump();
                    match self.peek() {
                        Some(next) if next.is_ascii_punctuation() => {
                            text.push(next);
                            self.bump();
                        }
                        _ => text.push('\\'),
                    }
                }
                '\r' => {
                    self.bump();
                }
                '{' => {
                    flush_text(&mut text, &mut nodes);
                    nodes.push(Node::Icu(self.parse_icu(ctx)?));
                }
                '}' => return Err(self.error(BodyErrorKind::UnmatchedCloseBrace)),
                '#' if ctx.in_plural => {
                    self.bump();
                    flush_text(&mut text, &mut nodes);
                    nodes.push(Node::Pound);
                }
                '$' if !ctx.in_label && self.starts_with("$[") => {
                    self.try_inline(Inline::Hook, ctx, &mut text, &mut nodes);
                }
                '[' if !ctx.in_label => self.try_inline(Inline::Link, ctx, &mut text, &mut nodes),
                '[' => {
                    if stop == Stop::LinkLabel {
                        self.label_openers.push(self.pos);
                    }
                    text.push(c);
                    self.bump();
                }
                '*' if !ctx.in_strong && self.starts_with("**") => {
                    self.try_inline(Inline::Strong, ctx, &mut text, &mut nodes);
                }
                '`' => self.try_inline(Inline::Code, ctx, &mut text, &mut nodes),
                _ => {
                    text.push(c);
                    self.bump();
                }
            }
        }

        if self.peek().is_none() {
            match stop {
                Stop::End => {}
                Stop::ArmEnd => return Err(self.error(BodyErrorKind::UnclosedPlaceholder)),
                Stop::LinkLabel | Stop::Strong => {
                    return Err(self.error(BodyErrorKind::Unterminated));
                }
            }
        }

        flush_text(&mut text, &mut nodes);
        Ok(nodes)
    }

    /// Attempts an inline construct, rewinding and keeping its first character as text if the
    /// construct is incomplete.
    fn try_inline(
        &mut self,
        inline: Inline,
        ctx: Context,
        text: &mut String,
        nodes: &mut Vec<Node>,
    ) {
        let start = self.pos;
        if !self.failed_inlines.contains(&(start, inline, ctx)) {
            let parsed = match inline {
                Inline::Hook => self.parse_hook(ctx),
                Inline::Link => self.parse_link(ctx),
                Inline::Strong => self.parse_strong(ctx),
                Inline::Code => Ok(self.parse_code()),
            };
            if let Ok(Some(node)) = parsed {
                flush_text(text, nodes);
                nodes.push(node);
                return;
            }
            self.failed_inlines.insert((start, inline, ctx));
        }
        self.pos = start;
        if let Some(c) = self.bump() {
            text.push(c);
        }
    }

    /// Parses a hook or link label up to, not including, the closing `]`.
    ///
    /// Returns the label with the offsets of the literal `[` directly inside it. A hook or
    /// link starting at one of those offsets would read the same remainder of this label, so
    /// it fails whenever the enclosing construct fails.
    fn parse_label(&mut self, ctx: Context) -> (Result<Vec<Node>, BodyParseError>, Vec<usize>) {
        self.label_openers.clear();
        let label = self.parse_nodes(Stop::LinkLabel, Context { in_label: true, ..ctx });
        (label, std::mem::take(&mut self.label_openers))
    }

    /// Records that every construct of kind `inline` opened at `openers` fails in `ctx`.
    fn mark_failed(&mut self, inline: Inline, openers: &[usize], ctx: Context) {
        for &opener in openers {
            let start = match inline {
                Inline::Hook => match opener.checked_sub(1) {
                    Some(dollar) if self.source.get(dollar..opener) == Some("$") => dollar,
                    _ => continue,
                },
                _ => opener,
            };
            self.failed_inlines.insert((start, inline, ctx));
        }
    }

    /// `$[label](hookName)`
    fn parse_hook(&mut self, ctx: Context) -> Result<Option<Node>, BodyParseError> {
        if !self.eat("$[") {
            return Ok(None);
        }
        let (content, openers) = self.parse_label(ctx);
        let hook = content.map(|content| self.parse_hook_name(content));
        if !matches!(hook, Ok(Some(_))) {
            self.mark_failed(Inline::Hook, &openers, ctx);
        }
        hook
    }

    /// `](hookName)` after a hook label.
    fn parse_hook_name(&mut self, content: Vec<Node>) -> Option<Node> {
        if !self.eat("](") {
            return None;
        }
        let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
        if name.is_empty() || !self.eat(")") {
            return None;
        }
        Some(Node::Hook { name: name.to_string(), content })
    }

    /// `[label](url)` or `[label]({placeholder})`
    fn parse_link(&mut self, ctx: Context) -> Result<Option<Node>, BodyParseError> {
        if !self.eat("[") {
            return Ok(None);
        }
        let (label, openers) = self.parse_label(ctx);
        let link = label.and_then(|label| self.parse_link_destination(label, ctx));
        if !matches!(link, Ok(Some(_))) {
            self.mark_failed(Inline::Link, &openers, ctx);
        }
        link
    }

    /// `](destination)` after a link label.
    fn parse_link_destination(
        &mut self,
        label: Vec<Node>,
        ctx: Context,
    ) -> Result<Option<Node>, BodyParseError> {
        if !self.eat("](") {
            return Ok(None);
        }
        let destination = if self.starts_with("{") {
            LinkDestination::Placeholder(self.parse_icu(ctx)?)
        } else {
            let url = self.take_while(|c| c != ')' && !c.is_whitespace());
            if url.is_empty() {
                return Ok(None);
            }
            LinkDestination::Url(url.to_string())
        };
        if !self.eat(")") {
            return Ok(None);
        }
        Ok(Some(Node::Link { label, destination }))
    }

    /// `**content**`
    fn parse_strong(&mut self, ctx: Context) -> Result<Option<Node>, BodyParseError> {
        if !self.eat("**") || self.peek().is_none_or(char::is_whitespace) {
            return Ok(None);
        }
        let content = self.parse_nodes(Stop::Strong, Context { in_strong: true, ..ctx })?;
        if content.is_empty() || !self.eat("**") {
            return Ok(None);
        }
        Ok(Some(Node::Strong(content)))
    }

    /// `` `code` ``
    fn parse_code(&mut self) -> Option<Node> {
        if !self.eat("`") {
            return None;
        }
        let code = self.take_while(|c| c != '`');
        if code.is_empty() || !self.eat("`") {
            return None;
        }
        Some(Node::Code(code.to_string()))
    }

    /// Parses a placeholder starting at `{`, enforcing [`MAX_NESTING_DEPTH`].
    fn parse_icu(&mut self, ctx: Context) -> Result<Icu, BodyParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error(BodyErrorKind::TooDeeplyNested));
        }
        self.depth += 1;
        let icu = self.parse_placeholder(ctx);
        self.depth -= 1;
        icu
    }

    /// Parses one placeholder.
    fn parse_placeholder(&mut self, ctx: Context) -> Result<Icu, BodyParseError> {
        self.eat("{");
        self.skip_whitespace();
        let name = self.take_while(is_name_char).to_string();
        if name.is_empty() {
            return Err(self.error(BodyErrorKind::InvalidPlaceholderName));
        }
        self.skip_whitespace();
        if self.eat("}") {
            return Ok(Icu::Argument { name });
        }
        if !self.eat(",") {
            return Err(self.error(BodyErrorKind::ExpectedPlaceholderEnd));
        }
        self.skip_whitespace();
        let kind = self.take_while(char::is_alphabetic);
        self.skip_whitespace();

        match kind {
            "number" => Ok(Icu::Number { style: self.parse_style()?, name }),
            "date" => Ok(Icu::Date { style: self.parse_style()?, name }),
            "time" => Ok(Icu::Time { style: self.parse_style()?, name }),
            "plural" | "selectordinal" => {
                let kind =
                    if kind == "plural" { PluralKind::Cardinal } else { PluralKind::Ordinal };
                self.expect_comma()?;
                let offset = self.parse_offset()?;
                let arms = self.parse_arms(&name, Context { in_plural: true, ..ctx })?;
                Ok(Icu::Plural { name, kind, offset, arms })
            }
            "select" => {
                self.expect_comma()?;
                let arms = self.parse_arms(&name, ctx)?;
                Ok(Icu::Select { name, arms })
            }
            "" => Err(self.error(BodyErrorKind::MissingArgumentType)),
            other => Err(self.error(BodyErrorKind::UnknownArgumentType(other.to_string()))),
        }
    }

    /// Consumes a `,` and any whitespace after it.
    fn expect_comma(&mut self) -> Result<(), BodyParseError> {
        if self.eat(",") {
            self.skip_whitespace();
            Ok(())
        } else {
            Err(self.error(BodyErrorKind::ExpectedPlaceholderEnd))
        }
    }

    /// Parses the optional `, style` of a formatted placeholder and its closing brace.
    fn parse_style(&mut self) -> Result<Option<String>, BodyParseError> {
        let style = if self.eat(",") {
            let style = self.take_while(|c| c != '}' && c != '{').trim();
            (!style.is_empty()).then(|| style.to_string())
        } else {
            None
        };
        self.skip_whitespace();
        if self.eat("}") { Ok(style) } else { Err(self.error(BodyErrorKind::UnclosedPlaceholder)) }
    }

    /// Parses an optional `offset:n`.
    fn parse_offset(&mut self) -> Result<u32, BodyParseError> {
        if !self.eat("offset:") {
            return Ok(0);
        }
        self.skip_whitespace();
        let digits = self.take_while(|c| c.is_ascii_digit());
        let offset = digits.parse().map_err(|_| self.error(BodyErrorKind::InvalidOffset))?;
        self.skip_whitespace();
        Ok(offset)
    }

    /// Parses `selector {content}` branches up to and including the closing `}`.
    fn parse_arms(&mut self, name: &str, ctx: Context) -> Result<Vec<Arm>, BodyParseError> {
        let mut arms = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.error(BodyErrorKind::UnclosedPlaceholder)),
                Some('}') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    let selector = self
                        .take_while(|c| !c.is_whitespace() && c != '{' && c != '}')
                        .to_string();
                    if selector.is_empty() {
                        return Err(self.error(BodyErrorKind::EmptyArmSelector));
                    }
                    self.skip_whitespace();
                    if !self.eat("{") {
                        return Err(self.error(BodyErrorKind::ExpectedArmContent(selector)));
                    }
                    let content = self.parse_nodes(Stop::ArmEnd, ctx)?;
                    self.eat("}");
                    arms.push(Arm { selector, content });
                }
            }
        }

        if arms.is_empty() {
            return Err(self.error(BodyErrorKind::MissingArms(name.to_string())));
        }
        if !arms.iter().any(|arm| arm.selector == "other") {
            return Err(self.error(BodyErrorKind::MissingOtherArm(name.to_string())));
        }
        Ok(arms)
    }
}
