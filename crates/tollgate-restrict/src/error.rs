//! Error types for decoration and restriction checks.
//!
//! Both error types convert into [`GatewayError`] so they can cross the host
//! trait boundary. Errors raised by the host are never converted: they pass
//! through `?` untouched.

use thiserror::Error;
use tollgate_types::GatewayError;

/// An object handed back to a decorating directory was not produced by it.
///
/// The host should only ever pass back objects this layer returned, so this
/// indicates a programming error. It is checked in every build profile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecorationError {
    #[error("expected an object decorated as {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl From<DecorationError> for GatewayError {
    fn from(err: DecorationError) -> Self {
        GatewayError::BadType(err.to_string())
    }
}

/// Access refused by a login or connection restriction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestrictionError {
    /// The current time falls in a denied window, or outside every allowed one.
    #[error("access to {subject} is not allowed at this time")]
    TimeDenied { subject: String },

    /// The remote address is denied, or not among the allowed hosts.
    #[error("access to {subject} is not allowed from {address}")]
    HostDenied { subject: String, address: String },

    /// Host restrictions exist but the remote address is unknown.
    #[error("access to {subject} requires a known remote address")]
    AddressUnknown { subject: String },
}

impl From<RestrictionError> for GatewayError {
    fn from(err: RestrictionError) -> Self {
        GatewayError::Security(err.to_string())
    }
}

/// A single restriction entry that could not be parsed.
///
/// Malformed entries are skipped (with a warning) rather than failing the
/// whole restriction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid time restriction {0:?}: expected D:HHMM-HHMM with D in 1-7 or *")]
    TimeEntry(String),

    #[error("time window {start}-{end} does not fit in one day (minutes must be below 1440)")]
    TimeBounds { start: u16, end: u16 },

    #[error("invalid host restriction {0:?}: expected an IP address or CIDR subnet")]
    HostEntry(String),

    #[error("host names are not resolved in host restrictions: {0:?}")]
    HostName(String),
}
