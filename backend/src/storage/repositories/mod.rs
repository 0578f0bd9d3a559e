pub mod habit_repository;
pub mod profile_repository;

pub use habit_repository::HabitRepository;
pub use profile_repository::ProfileRepository;
