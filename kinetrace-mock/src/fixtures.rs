pub mod gaps;
pub mod propulsion;
