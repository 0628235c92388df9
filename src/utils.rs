pub mod logging;
pub mod reference_verifier;
pub mod simulated_gateway;
