//! Authoritative server-side state for two-player, time-controlled chess rooms.
//!
//! [`game`] holds the room state machine and its registry; [`websocket`] and
//! [`routes`] expose it over actix-web.

pub mod config;
pub mod game;
pub mod models;
pub mod routes;
pub mod state;
pub mod websocket;
