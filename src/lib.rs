pub mod config;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod genbank;
pub mod ncbi;
pub mod output;
pub mod prompt;
pub mod report;
pub mod session;
pub mod workflow;
