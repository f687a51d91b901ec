use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    #[serde(rename = "PLC1")]
    A,
    #[serde(rename = "PLC2")]
    B,
}

impl Owner {
    pub fn other(self) -> Self {
        match self {
            Owner::A => Owner::B,
            Owner::B => Owner::A,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::A => f.write_str("PLC1"),
            Owner::B => f.write_str("PLC2"),
        }
    }
}

/// Persisted turn record.
///
/// The field names on disk are the ones the plant has always used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinationRecord {
    #[serde(rename = "current_plc")]
    pub current_owner: Owner,
    #[serde(rename = "plc1_completed", default)]
    pub a_completed: bool,
    #[serde(rename = "plc2_completed", default)]
    pub b_completed: bool,
}

impl Default for CoordinationRecord {
    fn default() -> Self {
        Self::initial(Owner::A)
    }
}

impl CoordinationRecord {
    /// Fresh record in which `first` holds the turn.
    pub fn initial(first: Owner) -> Self {
        Self {
            current_owner: first,
            a_completed: false,
            b_completed: false,
        }
    }

    pub fn completed(&self, owner: Owner) -> bool {
        match owner {
            Owner::A => self.a_completed,
            Owner::B => self.b_completed,
        }
    }

    fn set_completed(&mut self, owner: Owner, done: bool) {
        match owner {
            Owner::A => self.a_completed = done,
            Owner::B => self.b_completed = done,
        }
    }

    /// Whose turn it is: the current owner until it reports done, then the other.
    pub fn turn(&self) -> Owner {
        if self.completed(self.current_owner) {
            self.current_owner.other()
        } else {
            self.current_owner
        }
    }

    /// Mark `owner`'s turn as done. Caller checks `turn() == owner` first.
    pub(crate) fn mark_done(&mut self, owner: Owner) {
        self.current_owner = owner;
        self.set_completed(owner, true);
        self.set_completed(owner.other(), false);
    }
}
