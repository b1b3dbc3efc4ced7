pub mod health;
pub mod token;

pub use health::{health, metrics};
pub use token::token;
