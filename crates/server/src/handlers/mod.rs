//! HTTP request handlers.

pub mod databases;
pub mod health;
pub mod updates;

pub use databases::*;
pub use health::*;
pub use updates::*;
