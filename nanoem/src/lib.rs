pub mod common;
pub mod motion;
pub mod mutable;
pub mod utils;
