pub mod auth;
pub mod commands;
pub mod dto;
pub mod routes;
pub mod time;
