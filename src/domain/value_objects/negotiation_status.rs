//! # Negotiation Status
//!
//! Negotiation lifecycle state machine.
//!
//! # State Machine
//!
//! ```text
//! Open ─┬→ Accepted
//!       ├→ Rejected
//!       └→ Cancelled
//! ```
//!
//! `Open` is the only non-terminal state. Counter-offers loop inside `Open`
//! without changing the status.
//!
//! # Examples
//!
//! ```
//! use produce_market::domain::value_objects::negotiation_status::NegotiationStatus;
//!
//! let status = NegotiationStatus::Open;
//! assert!(status.can_transition_to(NegotiationStatus::Accepted));
//! assert!(!NegotiationStatus::Rejected.can_transition_to(NegotiationStatus::Accepted));
//! ```

use crate::domain::value_objects::enums::ParseEnumError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Negotiation lifecycle status.
///
/// # Terminal States
///
/// - [`Accepted`](NegotiationStatus::Accepted): the latest offer became the deal price
/// - [`Rejected`](NegotiationStatus::Rejected): one party declined
/// - [`Cancelled`](NegotiationStatus::Cancelled): one party withdrew
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum NegotiationStatus {
    /// Offers are still being exchanged.
    #[default]
    Open = 0,

    /// Both parties agreed on the latest offered price (terminal).
    Accepted = 1,

    /// One party rejected the negotiation (terminal).
    Rejected = 2,

    /// One party cancelled the negotiation (terminal).
    Cancelled = 3,
}

impl NegotiationStatus {
    /// Returns true if this is a terminal status.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Cancelled)
    }

    /// Returns true if this is the open status.
    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true if this status can transition to the target status.
    ///
    /// - Open → Accepted, Rejected, Cancelled
    /// - Terminal states → (none)
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Accepted) | (Self::Open, Self::Rejected) | (Self::Open, Self::Cancelled)
        )
    }

    /// Returns the valid next statuses from this status.
    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Open => vec![Self::Accepted, Self::Rejected, Self::Cancelled],
            Self::Accepted | Self::Rejected | Self::Cancelled => vec![],
        }
    }

    /// Returns the snake_case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for NegotiationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NegotiationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError::InvalidValue(
                "NegotiationStatus",
                s.to_string(),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [NegotiationStatus; 4] = [
        NegotiationStatus::Open,
        NegotiationStatus::Accepted,
        NegotiationStatus::Rejected,
        NegotiationStatus::Cancelled,
    ];

    mod terminal {
        use super::*;

        #[test]
        fn open_is_not_terminal() {
            assert!(!NegotiationStatus::Open.is_terminal());
            assert!(NegotiationStatus::Open.is_open());
        }

        #[test]
        fn closed_states_are_terminal() {
            for status in &ALL[1..] {
                assert!(status.is_terminal());
                assert!(!status.is_open());
            }
        }
    }

    mod transitions {
        use super::*;

        #[test]
        fn open_reaches_every_terminal_state() {
            for target in &ALL[1..] {
                assert!(NegotiationStatus::Open.can_transition_to(*target));
            }
        }

        #[test]
        fn open_cannot_self_transition() {
            assert!(!NegotiationStatus::Open.can_transition_to(NegotiationStatus::Open));
        }

        #[test]
        fn terminal_states_have_no_transitions() {
            for state in &ALL[1..] {
                assert!(state.valid_transitions().is_empty());
                for target in ALL {
                    assert!(!state.can_transition_to(target));
                }
            }
        }
    }

    #[test]
    fn display_and_parse() {
        for status in ALL {
            assert_eq!(status.to_string().parse::<NegotiationStatus>().unwrap(), status);
        }
        assert_eq!(
            "CANCELED".parse::<NegotiationStatus>().unwrap(),
            NegotiationStatus::Cancelled
        );
        assert!("pending".parse::<NegotiationStatus>().is_err());
    }

    #[test]
    fn default_is_open() {
        assert_eq!(NegotiationStatus::default(), NegotiationStatus::Open);
    }

    #[test]
    fn serde_is_snake_case() {
        let json = serde_json::to_string(&NegotiationStatus::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
    }
}
