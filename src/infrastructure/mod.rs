pub mod bulk;
pub mod history_repo;
pub mod registry_repo;
pub mod schedule_repo;
pub mod user_repo;
