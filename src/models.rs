pub mod auth;
pub mod gradebook;
pub mod records;
pub mod school;
