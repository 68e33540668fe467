pub mod accounts;
pub mod audit;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod health;
pub mod llm_client;
pub mod models;
pub mod recommendations;
pub mod reviews;
pub mod server;
pub mod summaries;
pub mod upstream;

#[cfg(test)]
pub(crate) mod testing;
