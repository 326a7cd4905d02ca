pub mod enums;
pub mod prescription;
pub mod user;

pub use enums::*;
pub use prescription::*;
pub use user::*;
