use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa_swagger_ui::SwaggerUi;

use crate::features::{battles, results, roster, votes};
use crate::middleware::auth::ApiKeys;
use crate::state::AppState;

pub fn app(state: AppState, api_keys: ApiKeys, openapi: utoipa::openapi::OpenApi) -> Router {
    let battle_routes = battles::routes::routes(api_keys.clone())
        .merge(roster::routes::battle_routes(api_keys.clone()))
        .merge(votes::routes::battle_routes(api_keys.clone()))
        .merge(results::routes::battle_routes(api_keys.clone()));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .nest("/api/battles", battle_routes)
        .nest("/api/criteria", votes::routes::criteria_routes(api_keys.clone()))
        .nest("/api/profiles", results::routes::profile_routes(api_keys.clone()))
        .nest("/api", roster::routes::routes(api_keys))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
