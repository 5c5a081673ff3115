pub mod cookies;
pub mod jwt;
pub mod password;
pub mod security;
pub mod time;

pub use password::*;
pub use time::*;
