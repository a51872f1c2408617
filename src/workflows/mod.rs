pub mod allotment;
pub mod roster;
