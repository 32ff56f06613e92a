pub mod policy;
pub mod service;
