pub mod catalog;
pub mod config;
pub mod export;
pub mod models;
pub mod parsing;
pub mod pricing;
