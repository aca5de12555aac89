//! Simulated transport and bus used to exercise a coupler end to end
pub mod sim_bus;
