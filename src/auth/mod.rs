pub mod handlers;
pub mod token;

pub use token::{Claims, TokenIssuer};
