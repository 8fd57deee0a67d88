pub mod activity;
pub mod aggregation;
pub mod app;
pub mod cli;
pub mod collector;
pub mod config;
pub mod logging;
pub mod output;
pub mod source;
pub mod store;
