pub mod prescription;
pub mod user;

pub use prescription::*;
pub use user::*;
