pub mod health;
pub mod sessions;
pub mod single_sign_out;
