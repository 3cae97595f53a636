use axum::{
    routing::{get, put},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/terms", get(handlers::list).post(handlers::create))
        .route(
            "/terms/:id",
            get(handlers::get)
                .patch(handlers::update)
                .delete(handlers::delete),
        )
        .route(
            "/terms/:id/equivalents",
            get(handlers::list_equivalents).post(handlers::create_equivalent),
        )
        .route(
            "/terms/:id/equivalents/:equivalent_id",
            put(handlers::update_equivalent).delete(handlers::delete_equivalent),
        )
}
