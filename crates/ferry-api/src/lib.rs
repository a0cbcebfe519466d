//! ferry-api
//!
//! Producer-facing HTTP surface:
//! - `POST /command` enqueue a message
//! - `GET /status` queue lengths
//! - `GET /status/{id}` status of one message

pub mod dto;
pub mod errors;
mod handlers;

use axum::Router;
use axum::routing::{get, post};
use ferry_core::Producer;

#[derive(Clone)]
pub struct ApiState {
    pub producer: Producer,
}

pub fn build_router(producer: Producer) -> Router {
    Router::new()
        .route("/command", post(handlers::submit_command))
        .route("/status", get(handlers::queue_status))
        .route("/status/{id}", get(handlers::message_status))
        .with_state(ApiState { producer })
}
