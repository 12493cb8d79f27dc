pub mod bar;
pub mod chain;
pub mod daily;
pub mod ids;
pub mod order;

pub use bar::*;
pub use chain::*;
pub use daily::*;
pub use ids::*;
pub use order::*;

#[cfg(test)]
mod tests;
