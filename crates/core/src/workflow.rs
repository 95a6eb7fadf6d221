//! Table-driven status machine shared by every workflow entity.
//!
//! Each entity's status enum implements [`StatusMachine`] by listing its
//! legal `(from, action, to)` triples. [`next_status`] is the only place a
//! transition is decided; handlers and repositories never compare status
//! strings themselves.

use std::fmt::Debug;

use crate::error::CoreError;

/// A status enum with an explicit transition table.
pub trait StatusMachine: Copy + Eq + Debug + 'static {
    /// The operations that move an entity between statuses.
    type Action: Copy + Eq + Debug + 'static;

    /// Entity name used in log fields and generic error text.
    const ENTITY: &'static str;

    /// Every legal `(from, action, to)` triple.
    const TRANSITIONS: &'static [(Self, Self::Action, Self)];

    /// Message returned when `action` is attempted from a status that does not
    /// permit it.
    fn rejection(action: Self::Action) -> String;
}

/// Resolve the status reached by applying `action` to `current`.
///
/// Returns [`CoreError::InvalidState`] (leaving the caller's entity untouched)
/// when the table has no matching row.
pub fn next_status<M: StatusMachine>(current: M, action: M::Action) -> Result<M, CoreError> {
    M::TRANSITIONS
        .iter()
        .find(|(from, a, _)| *from == current && *a == action)
        .map(|(_, _, to)| *to)
        .ok_or_else(|| CoreError::InvalidState(M::rejection(action)))
}

/// Check whether `action` is legal from `current`.
pub fn can_apply<M: StatusMachine>(current: M, action: M::Action) -> bool {
    next_status(current, action).is_ok()
}

/// All actions legal from `current`, in table order.
pub fn available_actions<M: StatusMachine>(current: M) -> Vec<M::Action> {
    let mut actions = Vec::new();
    for (from, action, _) in M::TRANSITIONS {
        if *from == current && !actions.contains(action) {
            actions.push(*action);
        }
    }
    actions
}

/// Statuses with no outgoing transition.
pub fn is_terminal<M: StatusMachine>(status: M) -> bool {
    !M::TRANSITIONS.iter().any(|(from, _, _)| *from == status)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Closed,
        Open,
        Locked,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum DoorAction {
        Open,
        Close,
        Lock,
    }

    impl StatusMachine for Door {
        type Action = DoorAction;
        const ENTITY: &'static str = "Door";
        const TRANSITIONS: &'static [(Self, Self::Action, Self)] = &[
            (Door::Closed, DoorAction::Open, Door::Open),
            (Door::Open, DoorAction::Close, Door::Closed),
            (Door::Closed, DoorAction::Lock, Door::Locked),
        ];

        fn rejection(action: DoorAction) -> String {
            format!("cannot {action:?} the door")
        }
    }

    #[test]
    fn legal_transition_resolves_target() {
        assert_eq!(next_status(Door::Closed, DoorAction::Open).unwrap(), Door::Open);
    }

    #[test]
    fn illegal_transition_is_invalid_state() {
        let result = next_status(Door::Open, DoorAction::Lock);
        assert_matches!(result, Err(CoreError::InvalidState(msg)) if msg == "cannot Lock the door");
    }

    #[test]
    fn available_actions_follow_table_order() {
        assert_eq!(
            available_actions(Door::Closed),
            vec![DoorAction::Open, DoorAction::Lock]
        );
    }

    #[test]
    fn terminal_detection() {
        assert!(is_terminal(Door::Locked));
        assert!(!is_terminal(Door::Open));
        assert!(!can_apply(Door::Locked, DoorAction::Open));
    }
}
