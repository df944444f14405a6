//! Parsed representation of a message body.

use serde::Serialize;

/// A fully parsed message body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    #[must_use]
    pub const fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the text of the document if it contains nothing but plain text.
    #[must_use]
    pub fn as_plain_text(&self) -> Option<String> {
        let mut text = String::new();
        for node in &self.nodes {
            let Node::Text(part) = node else {
                return None;
            };
            text.push_str(part);
        }
        Some(text)
    }
}

/// Inline content of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Node {
    Text(String),
    /// `#` inside a plural arm, referring to the plural's value.
    Pound,
    Icu(Icu),
    /// `$[label](hookName)`
    Hook { name: String, content: Vec<Node> },
    /// `[label](destination)`
    Link { label: Vec<Node>, destination: LinkDestination },
    /// `**content**`
    Strong(Vec<Node>),
    /// `` `code` ``
    Code(String),
}

/// Where a link points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkDestination {
    Url(String),
    Placeholder(Icu),
}

/// An ICU placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", rename_all = "camelCase")]
pub enum Icu {
    /// `{name}`
    Argument { name: String },
    /// `{name, number[, style]}`
    Number { name: String, style: Option<String> },
    /// `{name, date[, style]}`
    Date { name: String, style: Option<String> },
    /// `{name, time[, style]}`
    Time { name: String, style: Option<String> },
    /// `{name, plural, ...}` or `{name, selectordinal, ...}`
    Plural { name: String, kind: PluralKind, offset: u32, arms: Vec<Arm> },
    /// `{name, select, ...}`
    Select { name: String, arms: Vec<Arm> },
}

impl Icu {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Argument { name }
            | Self::Number { name, .. }
            | Self::Date { name, .. }
            | Self::Time { name, .. }
            | Self::Plural { name, .. }
            | Self::Select { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PluralKind {
    Cardinal,
    Ordinal,
}

/// One branch of a plural or select placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arm {
    pub selector: String,
    pub content: Vec<Node>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_plural_document() {
        let document = Document::new(vec![
            Node::Text("You have ".to_string()),
            Node::Icu(Icu::Plural {
                name: "count".to_string(),
                kind: PluralKind::Cardinal,
                offset: 0,
                arms: vec![
                    Arm { selector: "one".to_string(), content: vec![Node::Pound, Node::Text(" item".to_string())] },
                    Arm { selector: "other".to_string(), content: vec![Node::Strong(vec![Node::Pound])] },
                ],
            }),
        ]);

        assert_eq!(
            serde_json::to_value(&document).unwrap(),
            json!([
                { "type": "text", "value": "You have " },
                {
                    "type": "icu",
                    "value": {
                        "format": "plural",
                        "name": "count",
                        "kind": "cardinal",
                        "offset": 0,
                        "arms": [
                            { "selector": "one", "content": [{ "type": "pound" }, { "type": "text", "value": " item" }] },
                            { "selector": "other", "content": [{ "type": "strong", "value": [{ "type": "pound" }] }] }
                        ]
                    }
                }
            ])
        );
    }

    #[test]
    fn serializes_link_destinations() {
        let link = Node::Link {
            label: vec![Node::Text("docs".to_string())],
            destination: LinkDestination::Placeholder(Icu::Argument { name: "url".to_string() }),
        };

        assert_eq!(
            serde_json::to_value(&link).unwrap(),
            json!({
                "type": "link",
                "value": {
                    "label": [{ "type": "text", "value": "docs" }],
                    "destination": { "placeholder": { "format": "argument", "name": "url" } }
                }
            })
        );
    }
}
