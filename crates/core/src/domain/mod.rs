pub mod order;
pub mod playbook;
pub mod policy;
pub mod samples;
pub mod session;
pub mod simulation;
