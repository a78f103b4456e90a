pub mod error;
pub mod http;
pub mod models;
pub mod notice;
pub mod screens;
pub mod services;
pub mod state;
