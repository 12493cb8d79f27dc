pub mod engine;
pub mod errors;
pub mod ledger;
pub mod matching;
pub mod models;
pub mod pricing;
pub mod replay;
