pub mod frame;
pub mod indicators;

#[cfg(test)]
mod indicators_tests;

pub use frame::*;
pub use indicators::*;
