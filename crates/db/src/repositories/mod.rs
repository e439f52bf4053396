//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod notification_repo;
pub mod onboarding_repo;
pub mod progress_repo;
pub mod resource_repo;
pub mod role_repo;
pub mod session_repo;
pub mod training_progress_repo;
pub mod training_repo;
pub mod user_repo;

pub use notification_repo::NotificationRepo;
pub use onboarding_repo::{OnboardingStepRepo, OnboardingTrackRepo};
pub use progress_repo::{ProgressRepo, ProgressScope};
pub use resource_repo::{ResourceLink, ResourceRepo};
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use training_progress_repo::TrainingProgressRepo;
pub use training_repo::TrainingModuleRepo;
pub use user_repo::UserRepo;
