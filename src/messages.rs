//! The message model: parsed bodies, their variables and the records stored per key.

pub mod ast;
pub mod message;
pub mod parse;
pub mod value;
pub mod variables;

pub use message::{
    DEFAULT_TRANSLATIONS_PATH,
    Message,
    MessageDefinition,
    MessageMeta,
    MessageTranslation,
    SourceFileMeta,
    TranslationOrigin,
};
pub use value::MessageValue;
pub use variables::{
    MessageVariableType,
    MessageVariables,
};
