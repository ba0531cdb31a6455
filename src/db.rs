pub mod classroom_repo;
pub use classroom_repo::ClassroomRepository;
pub mod experience_field_repo;
pub use experience_field_repo::ExperienceFieldRepository;
pub mod gradebook_repo;
pub use gradebook_repo::GradebookRepository;
