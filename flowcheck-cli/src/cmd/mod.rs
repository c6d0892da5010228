pub mod config;
pub mod history;
pub mod migrate;
pub mod plan;
pub mod replay;
pub mod run;
pub mod validate;
