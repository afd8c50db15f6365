use serde::{Deserialize, Serialize};

/// What has happened to an object so far this tick.
///
/// Transitions only move forward: a killed object can be removed, but it can
/// never be moved or damaged again, and nothing returns to `Untouched`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectFate {
    #[default]
    Untouched,
    Moved,
    /// Left the room through an exit or a portal.
    Transferred,
    Damaged,
    /// Died from a movement crash (non-violent).
    Crashed,
    /// Died from combat damage (violent).
    Killed,
    Removed,
}

impl ObjectFate {
    pub fn can_become(self, next: ObjectFate) -> bool {
        use ObjectFate::*;
        match (self, next) {
            (_, Untouched) => false,
            (Untouched, _) => true,
            (Moved, Damaged | Killed | Removed) => true,
            (Damaged, Damaged | Killed | Removed) => true,
            (Crashed | Killed, Removed) => true,
            _ => false,
        }
    }

    pub fn is_dead(self) -> bool {
        matches!(self, ObjectFate::Crashed | ObjectFate::Killed | ObjectFate::Removed)
    }

    /// Dead or no longer in this room; later steps must leave it alone.
    pub fn is_gone(self) -> bool {
        self.is_dead() || self == ObjectFate::Transferred
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectFate::*;

    #[test]
    fn transitions_are_monotonic() {
        assert!(Untouched.can_become(Moved));
        assert!(Moved.can_become(Damaged));
        assert!(Damaged.can_become(Killed));
        assert!(Killed.can_become(Removed));
        assert!(Crashed.can_become(Removed));

        assert!(!Killed.can_become(Moved));
        assert!(!Killed.can_become(Killed));
        assert!(!Crashed.can_become(Killed));
        assert!(!Removed.can_become(Removed));
        assert!(!Transferred.can_become(Damaged));
        assert!(!Damaged.can_become(Moved));
        assert!(!Moved.can_become(Untouched));
    }
}
