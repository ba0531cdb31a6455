pub mod gradebooks;
pub mod kindergartens;
