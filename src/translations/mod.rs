use axum::{routing::get, Router};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/translations", get(handlers::list).post(handlers::create))
        .route(
            "/translations/:id",
            get(handlers::get)
                .patch(handlers::update)
                .delete(handlers::delete),
        )
}
