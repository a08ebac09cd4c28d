use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use super::handlers::{
    advance_phase, create_battle, delete_battle, get_battle, get_battle_overview, list_battles,
    set_visibility,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_battle))
        .route("/:battle_id", delete(delete_battle))
        .route("/:battle_id/phase", post(advance_phase))
        .route("/:battle_id/visibility", put(set_visibility))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/", get(list_battles))
        .route("/:battle_id", get(get_battle))
        .route("/:battle_id/overview", get(get_battle_overview))
        .merge(protected)
}
