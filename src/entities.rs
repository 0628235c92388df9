pub mod claim;
pub mod contribution;
pub mod money;
pub mod payment;
pub mod project;
pub mod reputation_event;
pub mod string_set;
pub mod task;
pub mod user;
