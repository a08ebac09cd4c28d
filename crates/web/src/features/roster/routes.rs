use axum::{
    Router, middleware,
    routing::{delete, post, put},
};

use super::handlers::{
    apply_as_judge, remove_candidate, remove_judge, remove_participant, select_candidate,
    submit_candidacy, update_judge_logistics, validate_judge,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

/// Applications, nested under `/api/battles`.
pub fn battle_routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/:battle_id/candidates", post(submit_candidacy))
        .route("/:battle_id/judges", post(apply_as_judge))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}

/// Roster records addressed by their own id, nested under `/api`.
pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/candidates/:candidate_id", delete(remove_candidate))
        .route("/candidates/:candidate_id/select", post(select_candidate))
        .route("/participants/:participant_id", delete(remove_participant))
        .route("/judges/:judge_id", delete(remove_judge))
        .route("/judges/:judge_id/validate", post(validate_judge))
        .route("/judges/:judge_id/logistics", put(update_judge_logistics))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
