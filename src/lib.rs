pub mod adapter;
pub mod config;
pub mod recommender;
pub mod store;
pub mod web;
