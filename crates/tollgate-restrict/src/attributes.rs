//! Restriction attributes and the forms that expose them.
//!
//! Restrictions are stored by the host as ordinary entity attributes. This
//! module names them, describes them to the form layer, and normalises their
//! values on the way in and out of decorated entities.

use std::sync::LazyLock;

use tollgate_types::{Attributes, Field, FieldType, Form};

/// Time windows during which access is allowed.
pub const RESTRICT_TIME_ALLOWED: &str = "guac-restrict-time-allowed";

/// Time windows during which access is denied.
pub const RESTRICT_TIME_DENIED: &str = "guac-restrict-time-denied";

/// Remote addresses or subnets from which access is allowed.
pub const RESTRICT_HOSTS_ALLOWED: &str = "guac-restrict-hosts-allowed";

/// Remote addresses or subnets from which access is denied.
pub const RESTRICT_HOSTS_DENIED: &str = "guac-restrict-hosts-denied";

/// Every restriction attribute, in form order.
pub const RESTRICT_ATTRIBUTES: [&str; 4] = [
    RESTRICT_TIME_ALLOWED,
    RESTRICT_TIME_DENIED,
    RESTRICT_HOSTS_ALLOWED,
    RESTRICT_HOSTS_DENIED,
];

/// Field kind rendered as a weekly time-window editor.
pub const TIME_RESTRICTION_FIELD: &str = "GUAC_TIME_RESTRICTION";

/// Field kind rendered as a host/subnet list editor.
pub const HOST_RESTRICTION_FIELD: &str = "GUAC_HOST_RESTRICTION";

/// Restriction form added to the connection attribute schema.
pub static RESTRICT_CONNECTION_FORM: LazyLock<Form> =
    LazyLock::new(|| restriction_form("restrict-connection-form"));

/// Restriction form added to the connection group attribute schema.
pub static RESTRICT_CONNECTION_GROUP_FORM: LazyLock<Form> =
    LazyLock::new(|| restriction_form("restrict-connection-group-form"));

/// Restriction form added to the user and user group attribute schemas.
pub static RESTRICT_LOGIN_FORM: LazyLock<Form> =
    LazyLock::new(|| restriction_form("restrict-login-form"));

fn restriction_form(name: &str) -> Form {
    let time = FieldType::extension(TIME_RESTRICTION_FIELD);
    let host = FieldType::extension(HOST_RESTRICTION_FIELD);

    Form::new(
        name,
        vec![
            Field::new(RESTRICT_TIME_ALLOWED, time.clone()),
            Field::new(RESTRICT_TIME_DENIED, time),
            Field::new(RESTRICT_HOSTS_ALLOWED, host.clone()),
            Field::new(RESTRICT_HOSTS_DENIED, host),
        ],
    )
}

/// Makes every restriction attribute present, mapping blank values to `None`.
///
/// Applied to attributes read through a decorated entity so that the form
/// layer always sees the restriction fields.
pub fn expose_restrictions(mut attributes: Attributes) -> Attributes {
    for name in RESTRICT_ATTRIBUTES {
        let value = attributes
            .remove(name)
            .flatten()
            .filter(|value| !value.trim().is_empty());
        attributes.insert(name.to_string(), value);
    }
    attributes
}

/// Maps blank restriction values to `None` before they reach the host.
///
/// Restriction attributes that are absent stay absent, so a partial update
/// never clears a restriction it did not mention.
pub fn normalize_restrictions(mut attributes: Attributes) -> Attributes {
    for name in RESTRICT_ATTRIBUTES {
        if let Some(value) = attributes.get_mut(name) {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }
    }
    attributes
}

/// The four restriction values of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestrictionAttributes {
    pub time_allowed: Option<String>,
    pub time_denied: Option<String>,
    pub hosts_allowed: Option<String>,
    pub hosts_denied: Option<String>,
}

impl RestrictionAttributes {
    /// Extracts restriction values from an attribute map. Empty values count
    /// as unset.
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let get = |name: &str| {
            attributes
                .get(name)
                .cloned()
                .flatten()
                .filter(|value| !value.trim().is_empty())
        };

        Self {
            time_allowed: get(RESTRICT_TIME_ALLOWED),
            time_denied: get(RESTRICT_TIME_DENIED),
            hosts_allowed: get(RESTRICT_HOSTS_ALLOWED),
            hosts_denied: get(RESTRICT_HOSTS_DENIED),
        }
    }

    /// Whether any host restriction is configured.
    pub fn has_host_restrictions(&self) -> bool {
        self.hosts_allowed.is_some() || self.hosts_denied.is_some()
    }

    /// Whether no restriction of any kind is configured.
    pub fn is_empty(&self) -> bool {
        self.time_allowed.is_none() && self.time_denied.is_none() && !self.has_host_restrictions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, Option<&str>)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn forms_carry_all_restriction_fields() {
        for form in [
            &*RESTRICT_CONNECTION_FORM,
            &*RESTRICT_CONNECTION_GROUP_FORM,
            &*RESTRICT_LOGIN_FORM,
        ] {
            let names: Vec<&str> = form.fields.iter().map(|f| f.name.as_str()).collect();
            assert_eq!(names, RESTRICT_ATTRIBUTES);
        }

        let field = RESTRICT_LOGIN_FORM.field(RESTRICT_HOSTS_DENIED).unwrap();
        assert_eq!(field.field_type.as_str(), HOST_RESTRICTION_FIELD);
    }

    #[test]
    fn forms_are_distinct_per_kind() {
        assert_ne!(*RESTRICT_CONNECTION_FORM, *RESTRICT_CONNECTION_GROUP_FORM);
        assert_ne!(*RESTRICT_CONNECTION_FORM, *RESTRICT_LOGIN_FORM);
    }

    #[test]
    fn form_json_uses_extension_field_type() {
        let json = serde_json::to_value(&*RESTRICT_CONNECTION_FORM).unwrap();
        assert_eq!(json["name"], "restrict-connection-form");
        assert_eq!(json["fields"][0]["type"], TIME_RESTRICTION_FIELD);
    }

    #[test]
    fn expose_adds_missing_restrictions() {
        let exposed = expose_restrictions(attrs(&[
            ("color", Some("blue")),
            (RESTRICT_TIME_DENIED, Some("")),
            (RESTRICT_HOSTS_ALLOWED, Some("10.0.0.0/8")),
        ]));

        assert_eq!(exposed.len(), 5);
        assert_eq!(exposed["color"].as_deref(), Some("blue"));
        assert_eq!(exposed[RESTRICT_TIME_ALLOWED], None);
        assert_eq!(exposed[RESTRICT_TIME_DENIED], None);
        assert_eq!(exposed[RESTRICT_HOSTS_ALLOWED].as_deref(), Some("10.0.0.0/8"));
        assert_eq!(exposed[RESTRICT_HOSTS_DENIED], None);
    }

    #[test]
    fn normalize_clears_empty_values_only() {
        let normalized = normalize_restrictions(attrs(&[
            ("note", Some("")),
            (RESTRICT_TIME_ALLOWED, Some("")),
            (RESTRICT_HOSTS_DENIED, Some("192.0.2.1")),
        ]));

        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized["note"].as_deref(), Some(""));
        assert_eq!(normalized[RESTRICT_TIME_ALLOWED], None);
        assert_eq!(normalized[RESTRICT_HOSTS_DENIED].as_deref(), Some("192.0.2.1"));
    }

    #[test]
    fn whitespace_only_values_count_as_unset_everywhere() {
        let stored = attrs(&[
            (RESTRICT_TIME_DENIED, Some("   ")),
            (RESTRICT_HOSTS_ALLOWED, Some("\t")),
        ]);

        let exposed = expose_restrictions(stored.clone());
        assert_eq!(exposed[RESTRICT_TIME_DENIED], None);
        assert_eq!(exposed[RESTRICT_HOSTS_ALLOWED], None);

        let normalized = normalize_restrictions(stored.clone());
        assert_eq!(normalized[RESTRICT_TIME_DENIED], None);
        assert_eq!(normalized[RESTRICT_HOSTS_ALLOWED], None);

        assert!(RestrictionAttributes::from_attributes(&stored).is_empty());
        assert!(!normalized.contains_key(RESTRICT_TIME_DENIED));
    }

    #[test]
    fn restriction_attributes_ignore_blank_values() {
        let restrictions = RestrictionAttributes::from_attributes(&attrs(&[
            (RESTRICT_TIME_ALLOWED, Some("  ")),
            (RESTRICT_HOSTS_DENIED, Some("203.0.113.0/24")),
        ]));

        assert_eq!(restrictions.time_allowed, None);
        assert!(restrictions.has_host_restrictions());
        assert!(!restrictions.is_empty());
        assert!(RestrictionAttributes::default().is_empty());
    }
}
