pub mod appointment;
pub mod artifact;
pub mod doctor;
pub mod enums;
pub mod filters;
pub mod patient;
pub mod prediction;
pub mod user;

pub use appointment::*;
pub use artifact::*;
pub use doctor::*;
pub use enums::*;
pub use filters::*;
pub use patient::*;
pub use prediction::*;
pub use user::*;
