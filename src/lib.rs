pub mod activity;
pub mod auth;
pub mod client;
pub mod db;
pub mod dto;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod notification;
pub mod remark;
pub mod routes;
pub mod state;
pub mod task;
pub mod user;
pub mod websocket;

#[cfg(test)]
mod testing;
