//! Restriction verification.
//!
//! Checks the time and host restrictions stored in an entity's attributes
//! against the current time and the caller's remote address. Checks run in
//! a fixed order and the first failure wins:
//!
//! 1. Denied time windows
//! 2. Allowed time windows
//! 3. Denied hosts
//! 4. Allowed hosts
//!
//! A matching denied entry refuses access. A non-empty allowed list that
//! does not match refuses access. An absent or empty list imposes nothing.

pub mod host;
pub mod time;

use chrono::{DateTime, Utc};
use tollgate_config::{RestrictConfig, TollgateConfig, UnknownAddressPolicy};
use tollgate_types::Attributes;
use tracing::{info, warn};

use crate::attributes::RestrictionAttributes;
use crate::error::RestrictionError;

pub use host::{HostRestriction, parse_address, parse_host_restrictions};
pub use time::{DailyRestriction, parse_time_restrictions};

/// Result type for restriction checks.
pub type Result<T> = std::result::Result<T, RestrictionError>;

/// Evaluates restrictions according to the configured policy.
#[derive(Debug, Clone)]
pub struct RestrictionVerifier {
    settings: RestrictConfig,
    audit_enabled: bool,
    clock: fn() -> DateTime<Utc>,
}

impl RestrictionVerifier {
    pub fn from_config(config: &TollgateConfig) -> Self {
        Self {
            settings: config.restrict.clone(),
            audit_enabled: config.audit.enabled,
            clock: Utc::now,
        }
    }

    /// Disables audit logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    /// Replaces the time source used by [`verify`](Self::verify).
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn enforces_login(&self) -> bool {
        self.settings.enforce_login
    }

    pub fn enforces_connections(&self) -> bool {
        self.settings.enforce_connections
    }

    /// Verifies the restrictions in `attributes` at the current time.
    ///
    /// `subject` names the restricted object in logs and errors, e.g.
    /// `"connection 12"`.
    pub fn verify(
        &self,
        subject: &str,
        attributes: &Attributes,
        remote_address: Option<&str>,
    ) -> Result<()> {
        self.verify_at(subject, attributes, remote_address, (self.clock)())
    }

    /// Verifies the restrictions in `attributes` at the given instant.
    pub fn verify_at(
        &self,
        subject: &str,
        attributes: &Attributes,
        remote_address: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let restrictions = RestrictionAttributes::from_attributes(attributes);
        if restrictions.is_empty() {
            return Ok(());
        }

        let outcome = self
            .verify_time(subject, &restrictions, now)
            .and_then(|()| self.verify_hosts(subject, &restrictions, remote_address));

        if self.audit_enabled {
            match &outcome {
                Ok(()) => info!(
                    subject = %subject,
                    remote_address = ?remote_address,
                    "Restrictions satisfied"
                ),
                Err(err) => warn!(
                    subject = %subject,
                    remote_address = ?remote_address,
                    reason = %err,
                    "Access refused by restriction"
                ),
            }
        }

        outcome
    }

    fn verify_time(
        &self,
        subject: &str,
        restrictions: &RestrictionAttributes,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let denied = || RestrictionError::TimeDenied {
            subject: subject.to_string(),
        };

        if let Some(text) = &restrictions.time_denied {
            if parse_time_restrictions(text).iter().any(|w| w.applies_at(now)) {
                return Err(denied());
            }
        }

        if let Some(text) = &restrictions.time_allowed {
            let allowed = parse_time_restrictions(text);
            if !allowed.is_empty() && !allowed.iter().any(|w| w.applies_at(now)) {
                return Err(denied());
            }
        }

        Ok(())
    }

    fn verify_hosts(
        &self,
        subject: &str,
        restrictions: &RestrictionAttributes,
        remote_address: Option<&str>,
    ) -> Result<()> {
        let denied_hosts = restrictions
            .hosts_denied
            .as_deref()
            .map(parse_host_restrictions)
            .unwrap_or_default();
        let allowed_hosts = restrictions
            .hosts_allowed
            .as_deref()
            .map(parse_host_restrictions)
            .unwrap_or_default();

        if denied_hosts.is_empty() && allowed_hosts.is_empty() {
            return Ok(());
        }

        let Some(address) = remote_address.and_then(parse_address) else {
            return match self.settings.unknown_address {
                UnknownAddressPolicy::Allow => Ok(()),
                UnknownAddressPolicy::Deny => Err(RestrictionError::AddressUnknown {
                    subject: subject.to_string(),
                }),
            };
        };

        let refused = || RestrictionError::HostDenied {
            subject: subject.to_string(),
            address: address.to_string(),
        };

        if denied_hosts.iter().any(|h| h.matches(address)) {
            return Err(refused());
        }

        if !allowed_hosts.is_empty() && !allowed_hosts.iter().any(|h| h.matches(address)) {
            return Err(refused());
        }

        Ok(())
    }
}

impl Default for RestrictionVerifier {
    fn default() -> Self {
        Self::from_config(&TollgateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{
        RESTRICT_HOSTS_ALLOWED, RESTRICT_HOSTS_DENIED, RESTRICT_TIME_ALLOWED,
        RESTRICT_TIME_DENIED,
    };
    use chrono::TimeZone;

    // Wednesday 2025-01-08 10:30 UTC
    fn wednesday_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 0).unwrap()
    }

    fn verifier() -> RestrictionVerifier {
        RestrictionVerifier::default()
            .without_audit()
            .with_clock(wednesday_morning)
    }

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), Some((*v).to_string())))
            .collect()
    }

    #[test]
    fn no_restrictions_allow_anything() {
        let result = verifier().verify("user alice", &Attributes::new(), None);
        assert!(result.is_ok());
    }

    #[test]
    fn allowed_window_admits_matching_time() {
        let attributes = attrs(&[(RESTRICT_TIME_ALLOWED, "3:0900-1700")]);
        assert!(verifier().verify("user alice", &attributes, None).is_ok());
    }

    #[test]
    fn allowed_window_refuses_other_times() {
        let attributes = attrs(&[(RESTRICT_TIME_ALLOWED, "1:0900-1700;5:0900-1700")]);
        assert_eq!(
            verifier().verify("user alice", &attributes, None),
            Err(RestrictionError::TimeDenied {
                subject: "user alice".to_string()
            })
        );
    }

    #[test]
    fn denied_window_wins_over_allowed_window() {
        let attributes = attrs(&[
            (RESTRICT_TIME_ALLOWED, "*:0000-2359"),
            (RESTRICT_TIME_DENIED, "3:1000-1100"),
        ]);
        assert!(matches!(
            verifier().verify("user alice", &attributes, None),
            Err(RestrictionError::TimeDenied { .. })
        ));
    }

    #[test]
    fn allowed_list_of_only_malformed_entries_imposes_nothing() {
        let attributes = attrs(&[(RESTRICT_TIME_ALLOWED, "someday:never")]);
        assert!(verifier().verify("user alice", &attributes, None).is_ok());
    }

    #[test]
    fn denied_host_refuses_address() {
        let attributes = attrs(&[(RESTRICT_HOSTS_DENIED, "198.51.100.0/24")]);
        assert_eq!(
            verifier().verify("connection 4", &attributes, Some("198.51.100.20")),
            Err(RestrictionError::HostDenied {
                subject: "connection 4".to_string(),
                address: "198.51.100.20".to_string(),
            })
        );
        assert!(
            verifier()
                .verify("connection 4", &attributes, Some("192.0.2.1"))
                .is_ok()
        );
    }

    #[test]
    fn allowed_hosts_refuse_other_addresses() {
        let attributes = attrs(&[(RESTRICT_HOSTS_ALLOWED, "10.0.0.0/8, 192.0.2.7")]);
        let v = verifier();

        assert!(v.verify("connection 4", &attributes, Some("10.9.8.7")).is_ok());
        assert!(v.verify("connection 4", &attributes, Some("192.0.2.7")).is_ok());
        assert!(v.verify("connection 4", &attributes, Some("192.0.2.8")).is_err());
    }

    #[test]
    fn unknown_address_follows_policy() {
        let attributes = attrs(&[(RESTRICT_HOSTS_ALLOWED, "10.0.0.0/8")]);

        let strict = verifier();
        assert!(matches!(
            strict.verify("connection 4", &attributes, None),
            Err(RestrictionError::AddressUnknown { .. })
        ));
        assert!(matches!(
            strict.verify("connection 4", &attributes, Some("not-an-address")),
            Err(RestrictionError::AddressUnknown { .. })
        ));

        let lenient = RestrictionVerifier::from_config(&TollgateConfig::permissive())
            .without_audit()
            .with_clock(wednesday_morning);
        assert!(lenient.verify("connection 4", &attributes, None).is_ok());
    }

    #[test]
    fn time_is_checked_before_hosts() {
        let attributes = attrs(&[
            (RESTRICT_TIME_DENIED, "3:0000-2359"),
            (RESTRICT_HOSTS_DENIED, "0.0.0.0/0"),
        ]);
        assert!(matches!(
            verifier().verify("user bob", &attributes, Some("192.0.2.1")),
            Err(RestrictionError::TimeDenied { .. })
        ));
    }

    #[test]
    fn enforcement_flags_follow_config() {
        let strict = RestrictionVerifier::default();
        assert!(strict.enforces_login());
        assert!(strict.enforces_connections());

        let lenient = RestrictionVerifier::from_config(&TollgateConfig::permissive());
        assert!(!lenient.enforces_login());
        assert!(!lenient.enforces_connections());
    }
}
