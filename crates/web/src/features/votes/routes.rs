use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{
    cast_comment, cast_vote, create_criteria, list_comments, list_criteria, list_votes,
    list_votes_by_judge,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

/// Nested under `/api/battles`.
pub fn battle_routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/:battle_id/votes", post(cast_vote))
        .route("/:battle_id/comments", post(cast_comment))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:battle_id/votes", get(list_votes))
        .route("/:battle_id/votes/judges/:judge_id", get(list_votes_by_judge))
        .route("/:battle_id/comments", get(list_comments))
        .merge(protected)
}

/// Nested under `/api/criteria`.
pub fn criteria_routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_criteria))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new().route("/", get(list_criteria)).merge(protected)
}
