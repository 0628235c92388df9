pub mod contribution_verifier;
pub mod payment_gateway;
pub mod repositories;
