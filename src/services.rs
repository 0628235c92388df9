pub mod claim_service;
pub mod contribution_service;
pub mod escrow_service;
pub mod outcome;
pub mod reputation_service;
pub mod task_service;
pub mod user_service;
