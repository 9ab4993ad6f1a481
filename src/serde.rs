//! JSON-deserializable format definition.
//!
//! These types describe a format in data rather than code. They are intended
//! to be constructed from JSON (for example a format file shipped with your
//! application) and then compiled into a [CompiledFormat] or, when names are
//! given, a [CompiledFormatDict].

use serde::{Deserialize, Serialize};

use crate::codec::{TextConfig, TextEncoding, TextErrors};
use crate::compiled::{CompiledFormat, CompiledFormatDict};
use crate::errors::CompileError;

/// Text encoding to use when decoding text fields.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub enum TextEncodingDef {
    #[default]
    /// UTF-8 encoded string.
    Utf8,
    /// ASCII encoded string.
    Ascii,
}

/// What to do with text bytes that are invalid under the encoding.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub enum TextErrorsDef {
    #[default]
    /// Fail the unpack call.
    Strict,
    /// Substitute the replacement character.
    Replace,
    /// Drop the offending bytes.
    Ignore,
}

/// Top-level format definition.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FormatDef {
    /// The format string, e.g. `"u1s7t24<"`.
    pub format: String,
    /// Optional field names; when present the definition compiles to the
    /// name-keyed facade and must list one name per non-padding field.
    #[serde(default)]
    pub names: Option<Vec<String>>,
    #[serde(default)]
    pub text_encoding: TextEncodingDef,
    #[serde(default)]
    pub text_errors: TextErrorsDef,
}

/// A compiled [FormatDef], positional or name-keyed depending on whether the
/// definition carried names.
#[derive(Debug, Clone)]
pub enum CompiledDef {
    Positional(CompiledFormat),
    Named(CompiledFormatDict),
}

impl FormatDef {
    pub fn compile(&self) -> Result<CompiledDef, CompileError> {
        let text = TextConfig {
            encoding: match self.text_encoding {
                TextEncodingDef::Utf8 => TextEncoding::Utf8,
                TextEncodingDef::Ascii => TextEncoding::Ascii,
            },
            errors: match self.text_errors {
                TextErrorsDef::Strict => TextErrors::Strict,
                TextErrorsDef::Replace => TextErrors::Replace,
                TextErrorsDef::Ignore => TextErrors::Ignore,
            },
        };

        match &self.names {
            Some(names) => {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                Ok(CompiledDef::Named(CompiledFormatDict::with_text_config(
                    &self.format,
                    &names,
                    text,
                )?))
            }
            None => Ok(CompiledDef::Positional(CompiledFormat::with_text_config(
                &self.format,
                text,
            )?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::collections::BTreeMap;

    #[test]
    fn test_positional_def() {
        let def = FormatDef {
            format: "u1u1s6u7u9".to_string(),
            names: None,
            text_encoding: TextEncodingDef::default(),
            text_errors: TextErrorsDef::default(),
        };
        let CompiledDef::Positional(cf) = def.compile().unwrap() else {
            panic!("expected positional");
        };
        let packed = cf
            .pack(&[
                Value::U64(0),
                Value::U64(0),
                Value::I64(-2),
                Value::U64(65),
                Value::U64(22),
            ])
            .unwrap();
        assert_eq!(packed, vec![0x3e, 0x82, 0x16]);
    }

    #[test]
    fn test_named_def() {
        let def = FormatDef {
            format: "p1u7".to_string(),
            names: Some(vec!["version".to_string()]),
            text_encoding: TextEncodingDef::default(),
            text_errors: TextErrorsDef::default(),
        };
        let CompiledDef::Named(cf) = def.compile().unwrap() else {
            panic!("expected named");
        };
        let mut values = BTreeMap::new();
        values.insert("version".to_string(), Value::U64(3));
        assert_eq!(cf.pack(&values).unwrap(), vec![0x03]);
    }

    #[test]
    fn test_name_count_checked_at_compile() {
        let def = FormatDef {
            format: "u1u1".to_string(),
            names: Some(vec!["only".to_string()]),
            text_encoding: TextEncodingDef::default(),
            text_errors: TextErrorsDef::default(),
        };
        assert_eq!(
            def.compile().unwrap_err(),
            CompileError::NameCountMismatch {
                expected: 2,
                got: 1
            }
        );
    }
}
