pub mod cache;
pub mod cas;
pub mod session;
