pub mod claim;
pub mod contribution;
pub mod payment;
pub mod project;
pub mod reputation_event;
pub mod task;
pub mod user;
