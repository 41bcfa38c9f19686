use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// States in the Election lifecycle.
///
/// `Draft -> Ongoing` happens on explicit launch by the creator, or via the
/// lifecycle sweep once the start time has passed; both triggers produce the
/// same target state, so their relative order is unobservable.
/// `Ongoing -> Completed` happens via the sweep once the end time has passed.
/// `Canceled` is terminal and only reachable by explicit creator action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionState {
    /// Under construction; not yet accepting ballots.
    Draft,
    /// In progress, accepting ballots.
    Ongoing,
    /// Past its end time; read-only.
    Completed,
    /// Abandoned by its creator; read-only.
    Canceled,
}

impl From<ElectionState> for Bson {
    fn from(state: ElectionState) -> Self {
        to_bson(&state).expect("Serialisation is infallible")
    }
}

/// The kind of office an election contests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionType {
    Presidential,
    Parliamentary,
    Mayoral,
    Councillor,
}

impl ElectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Presidential => "Presidential",
            Self::Parliamentary => "Parliamentary",
            Self::Mayoral => "Mayoral",
            Self::Councillor => "Councillor",
        }
    }
}

impl From<ElectionType> for Bson {
    fn from(ty: ElectionType) -> Self {
        to_bson(&ty).expect("Serialisation is infallible")
    }
}
