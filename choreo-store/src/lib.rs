#![forbid(unsafe_code)]

mod error;
mod message;
mod saga;

pub use error::*;
pub use message::*;
pub use saga::*;
