//! Variables referenced by a message body.

use indexmap::IndexMap;
use serde::Serialize;

use super::ast::{
    Document,
    Icu,
    LinkDestination,
    Node,
};

/// What kind of value a variable expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "options")]
pub enum MessageVariableType {
    /// Anything is accepted; used when the type can't be determined.
    Any,
    Number,
    /// A value used for plural selection.
    Plural,
    /// One of the listed select options. `other` marks an open set.
    Enum(Vec<String>),
    Date,
    Time,
    /// A function applying structure to its content (hooks, `b`, `code`).
    HookFunction,
    /// A hook that renders a link.
    LinkFunction,
}

impl MessageVariableType {
    /// Whether this type is a function supplied by the caller rather than a value.
    #[must_use]
    pub const fn is_function(&self) -> bool {
        matches!(self, Self::HookFunction | Self::LinkFunction)
    }
}

/// Every variable of a message, with one entry per occurrence, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageVariables {
    variables: IndexMap<String, Vec<MessageVariableType>>,
}

impl MessageVariables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the variables of a parsed document.
    #[must_use]
    pub fn from_document(document: &Document) -> Self {
        let mut variables = Self::new();
        variables.visit_nodes(document.nodes());
        variables
    }

    /// Records one occurrence of a variable.
    pub fn add_instance(&mut self, name: &str, kind: MessageVariableType) {
        self.variables.entry(name.to_string()).or_default().push(kind);
    }

    /// Copies every occurrence from `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        for (name, kinds) in &other.variables {
            self.variables.entry(name.clone()).or_default().extend(kinds.iter().cloned());
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Number of distinct variable names.
    #[must_use]
    pub fn count(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[MessageVariableType]> {
        self.variables.get(name).map(Vec::as_slice)
    }

    /// The most specific type recorded for `name`: the first occurrence that isn't `Any`.
    #[must_use]
    pub fn resolved_type(&self, name: &str) -> Option<&MessageVariableType> {
        let kinds = self.variables.get(name)?;
        kinds.iter().find(|kind| **kind != MessageVariableType::Any).or_else(|| kinds.first())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[MessageVariableType])> {
        self.variables.iter().map(|(name, kinds)| (name.as_str(), kinds.as_slice()))
    }

    /// Walks a node list, recording every variable.
    fn visit_nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.visit_node(node);
        }
    }

    /// Records the variables introduced by one node and its children.
    fn visit_node(&mut self, node: &Node) {
        match node {
            // `#` refers to the enclosing plural's value.
            Node::Text(_) | Node::Pound => {}
            Node::Icu(icu) => self.visit_icu(icu),
            Node::Hook { name, content } => {
                self.add_instance(name, MessageVariableType::HookFunction);
                self.visit_nodes(content);
            }
            Node::Link { label, destination } => {
                self.add_instance("link", MessageVariableType::LinkFunction);
                self.visit_nodes(label);
                if let LinkDestination::Placeholder(icu) = destination {
                    self.visit_icu(icu);
                }
            }
            Node::Strong(content) => {
                self.add_instance("b", MessageVariableType::HookFunction);
                self.visit_nodes(content);
            }
            Node::Code(_) => self.add_instance("code", MessageVariableType::HookFunction),
        }
    }

    /// Records a placeholder and anything inside its branches.
    fn visit_icu(&mut self, icu: &Icu) {
        match icu {
            Icu::Argument { name } => self.add_instance(name, MessageVariableType::Any),
            Icu::Number { name, .. } => self.add_instance(name, MessageVariableType::Number),
            Icu::Date { name, .. } => self.add_instance(name, MessageVariableType::Date),
            Icu::Time { name, .. } => self.add_instance(name, MessageVariableType::Time),
            Icu::Plural { name, arms, .. } => {
                self.add_instance(name, MessageVariableType::Plural);
                for arm in arms {
                    self.visit_nodes(&arm.content);
                }
            }
            Icu::Select { name, arms } => {
                let options = arms.iter().map(|arm| arm.selector.clone()).collect();
                self.add_instance(name, MessageVariableType::Enum(options));
                for arm in arms {
                    self.visit_nodes(&arm.content);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::messages::parse::parse_message_body;

    fn variables_of(source: &str) -> MessageVariables {
        MessageVariables::from_document(&parse_message_body(source).unwrap())
    }

    #[rstest]
    #[case::argument("{name}", "name", MessageVariableType::Any)]
    #[case::number("{n, number}", "n", MessageVariableType::Number)]
    #[case::date("{d, date, short}", "d", MessageVariableType::Date)]
    #[case::time("{t, time}", "t", MessageVariableType::Time)]
    #[case::plural("{n, plural, other {#}}", "n", MessageVariableType::Plural)]
    #[case::ordinal("{n, selectordinal, other {#}}", "n", MessageVariableType::Plural)]
    #[case::hook("$[go](onGo)", "onGo", MessageVariableType::HookFunction)]
    #[case::strong("**hi**", "b", MessageVariableType::HookFunction)]
    #[case::code("`x`", "code", MessageVariableType::HookFunction)]
    #[case::link("[a](https://a.b)", "link", MessageVariableType::LinkFunction)]
    fn detects_variable_type(
        #[case] source: &str,
        #[case] name: &str,
        #[case] expected: MessageVariableType,
    ) {
        let variables = variables_of(source);

        assert_eq!(variables.resolved_type(name), Some(&expected));
    }

    #[googletest::test]
    fn select_records_its_options() {
        let variables = variables_of("{gender, select, male {he} female {she} other {they}}");

        assert_eq!(
            variables.resolved_type("gender"),
            Some(&MessageVariableType::Enum(vec![
                "male".to_string(),
                "female".to_string(),
                "other".to_string()
            ]))
        );
    }

    #[googletest::test]
    fn collects_nested_variables_in_order() {
        let variables = variables_of(
            "{count, plural, one {{user} left} other {[**{user}**]({profileUrl}) and # others}}",
        );

        let names: Vec<_> = variables.names().collect();
        assert_eq!(names, vec!["count", "user", "link", "b", "profileUrl"]);
        expect_that!(variables.get("user").map(<[_]>::len), some(eq(2)));
    }

    #[googletest::test]
    fn resolved_type_prefers_specific_occurrence() {
        let variables = variables_of("{n} and {n, number}");

        assert_eq!(variables.resolved_type("n"), Some(&MessageVariableType::Number));
        expect_that!(variables.count(), eq(1));
    }

    #[googletest::test]
    fn merge_appends_occurrences() {
        let mut variables = variables_of("{a}");
        variables.merge(&variables_of("{a, number} {b}"));

        expect_that!(variables.get("a").map(<[_]>::len), some(eq(2)));
        expect_that!(variables.contains("b"), eq(true));
    }

    #[googletest::test]
    fn plain_text_has_no_variables() {
        expect_that!(variables_of("Just text #1").is_empty(), eq(true));
    }
}
