// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transition table for the training status lifecycle.
//!
//! ```text
//! STARTING -> PROCESSING -> SUCCEEDED | FAILED | CANCELED
//!     \__________________/^
//! ```
//!
//! Webhooks may arrive twice or out of order. A status already held is a
//! duplicate; anything that would move a record backwards, or from one
//! terminal state to another, is stale and never applied.

use std::str::FromStr;

use pixora_core::TrainingStatus;

/// What applying `next` to a record currently at `current` means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Forward move; persist it and run its side effects.
    Advance,
    /// The record already holds this status.
    Duplicate,
    /// Would regress the record or switch terminal states.
    Stale,
}

/// A status string from a webhook body, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// A status that can drive the record forward.
    Actionable(TrainingStatus),
    /// `starting`: the record is created in this state, nothing to do.
    Starting,
    Unknown(String),
}

impl StatusEvent {
    pub fn parse(raw: &str) -> Self {
        match TrainingStatus::from_str(raw.trim()) {
            Ok(TrainingStatus::Starting) => Self::Starting,
            Ok(status) => Self::Actionable(status),
            Err(_) => Self::Unknown(raw.to_string()),
        }
    }
}

pub fn transition(current: TrainingStatus, next: TrainingStatus) -> Transition {
    if current == next {
        return Transition::Duplicate;
    }
    if allowed_predecessors(next).contains(&current) {
        Transition::Advance
    } else {
        Transition::Stale
    }
}

/// States from which `next` is a forward move. Used as the compare-and-set
/// guard when persisting a transition.
pub fn allowed_predecessors(next: TrainingStatus) -> &'static [TrainingStatus] {
    use TrainingStatus::*;
    match next {
        Starting => &[],
        Processing => &[Starting],
        Succeeded | Failed | Canceled => &[Starting, Processing],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TrainingStatus::*;

    const ALL: [TrainingStatus; 5] = [Starting, Processing, Succeeded, Failed, Canceled];

    #[test]
    fn forward_moves_advance() {
        assert_eq!(transition(Starting, Processing), Transition::Advance);
        assert_eq!(transition(Starting, Succeeded), Transition::Advance);
        assert_eq!(transition(Processing, Succeeded), Transition::Advance);
        assert_eq!(transition(Processing, Failed), Transition::Advance);
        assert_eq!(transition(Processing, Canceled), Transition::Advance);
    }

    #[test]
    fn same_state_is_duplicate() {
        for status in ALL {
            assert_eq!(transition(status, status), Transition::Duplicate);
        }
    }

    #[test]
    fn terminal_states_never_move() {
        for current in [Succeeded, Failed, Canceled] {
            for next in ALL {
                if next != current {
                    assert_eq!(transition(current, next), Transition::Stale, "{current} -> {next}");
                }
            }
        }
    }

    #[test]
    fn processing_cannot_go_back_to_starting() {
        assert_eq!(transition(Processing, Starting), Transition::Stale);
    }

    #[test]
    fn parse_classifies_provider_statuses() {
        assert_eq!(StatusEvent::parse("processing"), StatusEvent::Actionable(Processing));
        assert_eq!(StatusEvent::parse("succeeded"), StatusEvent::Actionable(Succeeded));
        assert_eq!(StatusEvent::parse("canceled"), StatusEvent::Actionable(Canceled));
        assert_eq!(StatusEvent::parse("starting"), StatusEvent::Starting);
        assert_eq!(
            StatusEvent::parse("queued"),
            StatusEvent::Unknown("queued".to_string())
        );
    }
}
