pub mod claim_repo;
pub mod contribution_repo;
pub mod payment_repo;
pub mod project_repo;
pub mod reputation_event_repo;
pub mod task_repo;
pub mod user_repo;
