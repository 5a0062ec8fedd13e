pub mod data;
pub mod topic;

pub use data::{DecodedMessage, FieldValue, MachineRecord, RawEvent};
pub use topic::{filter_matches, validate_filter, wildcard_segment};
