pub mod config;
pub mod database;
pub mod entities;
pub mod init;
pub mod interfaces;
pub mod jobs;
pub mod middleware;
pub mod services;
pub mod utils;
