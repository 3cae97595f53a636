use axum::{routing::get, Router};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dialects", get(handlers::list).post(handlers::create))
        .route(
            "/dialects/:id",
            get(handlers::get)
                .patch(handlers::update)
                .delete(handlers::delete),
        )
}
