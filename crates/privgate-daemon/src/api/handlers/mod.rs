//! API request handlers

mod decisions;
mod health;
mod packages;
mod profiles;
mod prompts;

pub use decisions::*;
pub use health::*;
pub use packages::*;
pub use profiles::*;
pub use prompts::*;
