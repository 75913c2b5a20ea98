pub mod config;
pub mod error;
pub mod fake_provider;
pub mod features;
pub mod fixtures;
pub mod http_client;
pub mod model;
pub mod predictor;
pub mod provider;
pub mod season;
pub mod stats;
pub mod web;
