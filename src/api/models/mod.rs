pub mod extraction;
pub mod usage;
