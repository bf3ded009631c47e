pub mod adapters;
pub mod config;
pub mod error;
pub mod files;
pub mod web;
