//! Attribute schema descriptors.
//!
//! Forms describe the attributes an entity kind may carry, so the host's
//! form-rendering layer knows what to display. Forms are compared by value.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A set of forms. Adding an equal form twice has no effect.
pub type FormSet = BTreeSet<Form>;

/// The kind of input a field accepts.
///
/// Host kinds serialize to their upper-case wire name. Kinds defined by
/// extensions serialize to the name the extension chose.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FieldType {
    Text,
    Username,
    Password,
    Numeric,
    Boolean,
    Enum,
    Multiline,
    Email,
    Timezone,
    Date,
    Time,
    /// A field kind defined by an extension.
    ///
    /// Build these with [`FieldType::extension`]. A literal
    /// `Extension("TEXT")` serializes as `"TEXT"` and reads back as
    /// [`FieldType::Text`], so it never equals itself after a round trip.
    Extension(String),
}

impl FieldType {
    /// Returns the kind named `name`, resolving host wire names to the
    /// matching host kind.
    pub fn extension(name: impl Into<String>) -> Self {
        Self::from(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Username => "USERNAME",
            FieldType::Password => "PASSWORD",
            FieldType::Numeric => "NUMERIC",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Enum => "ENUM",
            FieldType::Multiline => "MULTILINE",
            FieldType::Email => "EMAIL",
            FieldType::Timezone => "TIMEZONE",
            FieldType::Date => "DATE",
            FieldType::Time => "TIME",
            FieldType::Extension(name) => name,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "TEXT" => FieldType::Text,
            "USERNAME" => FieldType::Username,
            "PASSWORD" => FieldType::Password,
            "NUMERIC" => FieldType::Numeric,
            "BOOLEAN" => FieldType::Boolean,
            "ENUM" => FieldType::Enum,
            "MULTILINE" => FieldType::Multiline,
            "EMAIL" => FieldType::Email,
            "TIMEZONE" => FieldType::Timezone,
            "DATE" => FieldType::Date,
            "TIME" => FieldType::Time,
            _ => FieldType::Extension(value),
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        match value {
            FieldType::Extension(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

/// A single named input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Allowed values, for enumerated kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            options: Vec::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// A named group of fields rendered together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Form {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Form {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Returns the field with the given name, if present.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(FieldType::Text, "\"TEXT\""; "text")]
    #[test_case(FieldType::Timezone, "\"TIMEZONE\""; "timezone")]
    #[test_case(FieldType::Extension("GUAC_HOST_RESTRICTION".into()), "\"GUAC_HOST_RESTRICTION\""; "extension")]
    fn field_type_wire_names(field_type: FieldType, expected: &str) {
        let json = serde_json::to_string(&field_type).unwrap();
        assert_eq!(json, expected);

        let back: FieldType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, field_type);
    }

    #[test]
    fn extension_constructor_resolves_host_names() {
        assert_eq!(FieldType::extension("TEXT"), FieldType::Text);
        assert_eq!(
            FieldType::extension("GUAC_TIME_RESTRICTION"),
            FieldType::Extension("GUAC_TIME_RESTRICTION".into())
        );

        let literal = FieldType::Extension("TEXT".into());
        let back: FieldType =
            serde_json::from_str(&serde_json::to_string(&literal).unwrap()).unwrap();
        assert_eq!(back, FieldType::Text);
        assert_eq!(back, FieldType::extension("TEXT"));
    }

    #[test]
    fn form_serializes_with_type_key() {
        let form = Form::new(
            "login",
            vec![
                Field::new("username", FieldType::Username),
                Field::new("mode", FieldType::Enum).with_options(["a", "b"]),
            ],
        );

        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["name"], "login");
        assert_eq!(json["fields"][0]["type"], "USERNAME");
        assert!(json["fields"][0].get("options").is_none());
        assert_eq!(json["fields"][1]["options"][1], "b");
    }

    #[test]
    fn form_set_ignores_equal_forms() {
        let form = Form::new("extra", vec![Field::new("x", FieldType::Text)]);
        let mut set = FormSet::new();
        assert!(set.insert(form.clone()));
        assert!(!set.insert(form.clone()));
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().and_then(|f| f.field("x")), form.field("x"));
    }
}
