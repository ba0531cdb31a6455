pub mod aggregation;
pub mod auth;
pub mod evaluation_service;
pub mod gradebook_service;

pub use evaluation_service::EvaluationService;
pub use gradebook_service::GradebookService;
