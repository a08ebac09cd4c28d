use anyhow::Context;
use storage::{Database, MemoryStore};
use utoipa::OpenApi;

mod config;
mod error;
mod features;
mod middleware;
mod routes;
mod state;

use config::{Config, StorageBackend};
use features::{battles, results, roster, votes};
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        battles::handlers::list_battles,
        battles::handlers::get_battle,
        battles::handlers::get_battle_overview,
        battles::handlers::create_battle,
        battles::handlers::advance_phase,
        battles::handlers::set_visibility,
        battles::handlers::delete_battle,
        roster::handlers::submit_candidacy,
        roster::handlers::select_candidate,
        roster::handlers::remove_candidate,
        roster::handlers::remove_participant,
        roster::handlers::apply_as_judge,
        roster::handlers::validate_judge,
        roster::handlers::update_judge_logistics,
        roster::handlers::remove_judge,
        votes::handlers::list_votes,
        votes::handlers::list_votes_by_judge,
        votes::handlers::cast_vote,
        votes::handlers::list_comments,
        votes::handlers::cast_comment,
        votes::handlers::list_criteria,
        votes::handlers::create_criteria,
        results::handlers::get_standings,
        results::handlers::get_result,
        results::handlers::declare_result,
        results::handlers::distribute_rewards,
        results::handlers::list_credit_transactions,
    ),
    components(
        schemas(
            storage::dto::battle::CreateBattleRequest,
            storage::dto::battle::AdvancePhaseRequest,
            storage::dto::battle::VisibilityRequest,
            storage::dto::battle::BattleOverview,
            storage::dto::roster::SubmitCandidacyRequest,
            storage::dto::roster::JudgeApplicationRequest,
            storage::dto::roster::JudgeLogisticsRequest,
            storage::dto::vote::CastVoteRequest,
            storage::dto::vote::CastCommentRequest,
            storage::dto::vote::CreateCriteriaRequest,
            storage::dto::result::DeclareResultRequest,
            storage::dto::result::ManualResult,
            storage::dto::result::JudgeSubScore,
            storage::dto::result::ParticipantScore,
            storage::dto::result::Standings,
            storage::dto::result::RewardOutcome,
            storage::models::Battle,
            storage::models::BattlePhase,
            storage::models::BattleConstraint,
            storage::models::Candidate,
            storage::models::Participant,
            storage::models::Judge,
            storage::models::JudgeLogistics,
            storage::models::Criteria,
            storage::models::CriteriaScore,
            storage::models::VoteComment,
            storage::models::BattleResult,
            storage::models::CreditTransaction,
        )
    ),
    tags(
        (name = "battles", description = "Battle lifecycle and visibility"),
        (name = "roster", description = "Candidates, participants and judges"),
        (name = "votes", description = "Judge scores, comments and criteria"),
        (name = "results", description = "Standings, declared results and rewards"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting jam battle API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    let state = match (config.storage_backend, config.database_url.as_deref()) {
        (StorageBackend::Postgres, Some(database_url)) => {
            tracing::info!(
                "Connecting to database at: {}",
                database_url.split('@').next_back().unwrap_or("unknown")
            );
            let db = Database::new(database_url)
                .await
                .context("Failed to initialize database")?;
            tracing::info!("Database connection established");

            tracing::info!("Running database migrations");
            db.run_migrations()
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Database migrations completed successfully");

            AppState::new(db)
        }
        (StorageBackend::Postgres, None) => anyhow::bail!("DATABASE_URL is required for postgres"),
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using the in-memory store, nothing survives a restart");
            AppState::new(MemoryStore::new())
        }
    };

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, every organizer endpoint will answer 401");
    }

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let app = routes::app(state, api_keys, ApiDoc::openapi());

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}
