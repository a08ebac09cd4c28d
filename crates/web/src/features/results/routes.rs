use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{
    declare_result, distribute_rewards, get_result, get_standings, list_credit_transactions,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

/// Nested under `/api/battles`.
pub fn battle_routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/:battle_id/result", post(declare_result))
        .route("/:battle_id/rewards", post(distribute_rewards))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:battle_id/standings", get(get_standings))
        .route("/:battle_id/result", get(get_result))
        .merge(protected)
}

/// Nested under `/api/profiles`.
pub fn profile_routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/:user_id/transactions", get(list_credit_transactions))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
