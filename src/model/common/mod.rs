mod election;

pub use election::{ElectionState, ElectionType};
