// WebSocket front end for the statline stats engine.

pub mod app;
pub mod config;
pub mod protocol;
pub mod ws_server;
