//! TypeScript declarations for definitions files.

use std::path::Path;

use crate::database::MessagesDatabase;
use crate::error::{
    DatabaseError,
    DatabaseResult,
    NotFoundKind,
};
use crate::messages::{
    Message,
    MessageVariableType,
    MessageVariables,
};

/// Package the generated declarations import their runtime types from.
pub const RUNTIME_TYPES_PACKAGE: &str = "@intl-message-db/runtime";

/// Variables the runtime provides defaults for, so callers may omit them.
const BUILTIN_FUNCTIONS: &[&str] = &["b", "code", "link"];

/// Header of every generated file.
const GENERATED_HEADER: &str = "/* THIS FILE IS AUTOGENERATED. DO NOT EDIT MANUALLY. */";

impl MessagesDatabase {
    /// Renders the declaration file for `source_path`.
    ///
    /// With `allow_nullability`, every argument is optional and accepts `null`.
    ///
    /// # Errors
    /// `NotFound` if the path was never ingested.
    pub fn render_types(&self, source_path: &str, allow_nullability: bool) -> DatabaseResult<String> {
        let state = self.read_state();
        let source = state.sources.get(source_path).ok_or_else(|| {
            DatabaseError::NotFound(NotFoundKind::SourceFile(source_path.to_string()))
        })?;

        let mut output = String::new();
        output.push_str(GENERATED_HEADER);
        output.push('\n');
        output.push_str(&format!(
            "import type {{ HandlerFunction, LinkFunction, TypedIntlMessageGetter }} from '{RUNTIME_TYPES_PACKAGE}';\n\n"
        ));
        output.push_str("export declare const messages: {\n");
        for message in state.file_messages(source) {
            render_message(&mut output, message, allow_nullability);
        }
        output.push_str("};\n\nexport default messages;\n");
        Ok(output)
    }

    /// Renders the declaration file for `source_path` and writes it to `output_path`.
    ///
    /// # Errors
    /// Everything [`Self::render_types`] returns, plus `Io` if the file can't be written.
    pub fn generate_types(
        &self,
        source_path: &str,
        output_path: &Path,
        allow_nullability: bool,
    ) -> DatabaseResult<()> {
        let declarations = self.render_types(source_path, allow_nullability)?;
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output_path, declarations)?;
        tracing::debug!(file = %source_path, output = %output_path.display(), "Wrote type declarations");
        Ok(())
    }
}

/// Appends the doc comment and getter declaration of one message.
fn render_message(output: &mut String, message: &Message, allow_nullability: bool) {
    // 定義が無いメッセージは型を持たない
    let Some(value) = message.source_value() else {
        return;
    };

    output.push_str("  /**\n");
    if let Some(description) = message.description() {
        for line in description.lines() {
            output.push_str(&format!("   * {}\n", escape_comment(line)));
        }
        output.push_str("   *\n");
    }
    output.push_str("   * ```text\n");
    for line in value.raw.lines() {
        output.push_str(&format!("   * {}\n", escape_comment(line)));
    }
    output.push_str("   * ```\n");
    output.push_str("   */\n");
    output.push_str(&format!(
        "  {}: TypedIntlMessageGetter<{}>;\n",
        quote(message.key()),
        render_arguments(&value.variables, allow_nullability)
    ));
}

/// Renders the argument object type of a message.
fn render_arguments(variables: &MessageVariables, allow_nullability: bool) -> String {
    if variables.is_empty() {
        return "{}".to_string();
    }
    let properties: Vec<String> = variables
        .names()
        .map(|name| {
            let kind = variables.resolved_type(name).unwrap_or(&MessageVariableType::Any);
            let optional = allow_nullability || (BUILTIN_FUNCTIONS.contains(&name) && kind.is_function());
            let mut rendered = variable_type(kind);
            if allow_nullability {
                rendered.push_str(" | null | undefined");
            }
            format!("{}{}: {rendered}", property_name(name), if optional { "?" } else { "" })
        })
        .collect();
    format!("{{ {} }}", properties.join(", "))
}

/// TypeScript type accepted for a variable.
fn variable_type(kind: &MessageVariableType) -> String {
    match kind {
        MessageVariableType::Any => "any".to_string(),
        MessageVariableType::Number | MessageVariableType::Plural => "number".to_string(),
        MessageVariableType::Date | MessageVariableType::Time => "Date | number | string".to_string(),
        MessageVariableType::HookFunction => "HandlerFunction".to_string(),
        MessageVariableType::LinkFunction => "LinkFunction".to_string(),
        MessageVariableType::Enum(options) => {
            let mut members: Vec<String> = options
                .iter()
                .filter(|option| option.as_str() != "other")
                .map(|option| quote(option))
                .collect();
            // `other` は任意の文字列を受け付ける
            if options.iter().any(|option| option == "other") {
                members.push("(string & {})".to_string());
            }
            if members.is_empty() { "string".to_string() } else { members.join(" | ") }
        }
    }
}

/// Uses `name` as a bare property name when it is a valid identifier, quoted otherwise.
fn property_name(name: &str) -> String {
    let mut chars = name.chars();
    let is_identifier = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if is_identifier { name.to_string() } else { quote(name) }
}

/// Single-quoted string literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Keeps a line from closing the surrounding block comment.
fn escape_comment(line: &str) -> String {
    line.replace("*/", "*\\/")
}
