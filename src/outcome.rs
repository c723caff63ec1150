//! Tri-state result wrapper used by every operation that crosses the
//! cache/remote boundary.
//!
//! `Outcome` distinguishes "no data yet" (`Loading`) from "have data"
//! (`Success`) from "failed, possibly with stale data" (`Error`). The
//! `Error` and `Loading` variants may still carry a payload so consumers
//! can render partially-degraded views, but only `Success` ever means the
//! data is current.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome<T> {
    /// A usable payload. `stale` marks data served from cache after a
    /// remote failure.
    Success { value: T, stale: bool },
    /// A failure with a human-readable message. `last_known` carries the
    /// last good value if one exists.
    Error {
        message: String,
        last_known: Option<T>,
    },
    /// An operation still in flight, optionally with partial data.
    Loading { partial: Option<T> },
}

impl<T> Outcome<T> {
    /// A fresh success.
    pub fn success(value: T) -> Self {
        Outcome::Success {
            value,
            stale: false,
        }
    }

    /// A success served from cache after the remote failed.
    pub fn stale(value: T) -> Self {
        Outcome::Success { value, stale: true }
    }

    /// A failure with no fallback data.
    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Error {
            message: message.into(),
            last_known: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Outcome::Loading { .. })
    }

    /// The successful payload, if this is a `Success`.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The error message, if this is an `Error`.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Outcome::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whatever payload is available, regardless of variant.
    pub fn any_value(&self) -> Option<&T> {
        match self {
            Outcome::Success { value, .. } => Some(value),
            Outcome::Error { last_known, .. } => last_known.as_ref(),
            Outcome::Loading { partial } => partial.as_ref(),
        }
    }

    /// Run `f` on the payload if this is a `Success`, then return self
    /// unchanged for chaining.
    pub fn on_success(self, f: impl FnOnce(&T)) -> Self {
        if let Outcome::Success { ref value, .. } = self {
            f(value);
        }
        self
    }

    /// Run `f` on the message if this is an `Error`, then return self
    /// unchanged for chaining.
    pub fn on_error(self, f: impl FnOnce(&str)) -> Self {
        if let Outcome::Error { ref message, .. } = self {
            f(message);
        }
        self
    }

    /// Run `f` if this is a `Loading`, then return self unchanged.
    pub fn on_loading(self, f: impl FnOnce(Option<&T>)) -> Self {
        if let Outcome::Loading { ref partial } = self {
            f(partial.as_ref());
        }
        self
    }

    /// Transform the payload while preserving the variant, staleness flag
    /// and error message. An `Error` with no data stays an `Error` with no
    /// data; `map` never invents a value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success { value, stale } => Outcome::Success {
                value: f(value),
                stale,
            },
            Outcome::Error {
                message,
                last_known,
            } => Outcome::Error {
                message,
                last_known: last_known.map(f),
            },
            Outcome::Loading { partial } => Outcome::Loading {
                partial: partial.map(f),
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
