//! Sitebeam API composition root.

#![forbid(unsafe_code)]

mod bootstrap;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::extract::Extension;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post};
use sitebeam_application::{
    AccessRequirement, AssignmentRepository, AuthorizationService, Clock, DecisionCache,
    MANAGE_ASSIGNMENTS_PERMISSION, MANAGE_ROLES_PERMISSION, PermissionRegistry, RoleRepository,
    SecurityAdminService, SystemClock,
};
use sitebeam_core::{AppError, UserId};
use sitebeam_domain::PermissionId;
use sitebeam_infrastructure::{
    InMemoryDecisionCache, PostgresAssignmentRepository, PostgresAuditRepository,
    PostgresRoleRepository,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let allowed_origin =
        env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);
    let cache_ttl_seconds = env::var("DECISION_CACHE_TTL_SECONDS")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(30);
    let bootstrap_admin_user_id = env::var("BOOTSTRAP_ADMIN_USER_ID")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| {
            uuid::Uuid::parse_str(value.as_str())
                .map(UserId::from_uuid)
                .map_err(|error| {
                    AppError::Validation(format!("invalid BOOTSTRAP_ADMIN_USER_ID: {error}"))
                })
        })
        .transpose()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let registry = Arc::new(PermissionRegistry::builtin()?);
    let role_repository: Arc<dyn RoleRepository> =
        Arc::new(PostgresRoleRepository::new(pool.clone()));
    let assignment_repository: Arc<dyn AssignmentRepository> =
        Arc::new(PostgresAssignmentRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let decision_cache: Arc<dyn DecisionCache> =
        Arc::new(InMemoryDecisionCache::new(clock.clone(), cache_ttl_seconds));

    let authorization_service = AuthorizationService::new(
        registry.clone(),
        role_repository.clone(),
        assignment_repository.clone(),
        decision_cache.clone(),
        clock.clone(),
    );
    let security_admin_service = SecurityAdminService::new(
        authorization_service.clone(),
        registry.clone(),
        role_repository.clone(),
        assignment_repository.clone(),
        decision_cache,
        audit_repository,
        clock.clone(),
    );

    bootstrap::seed_system_roles(&role_repository, registry.as_ref()).await?;
    if let Some(admin_user_id) = bootstrap_admin_user_id {
        bootstrap::seed_bootstrap_admin(&assignment_repository, &clock, admin_user_id).await?;
    }

    let app_state = AppState {
        authorization_service,
        security_admin_service,
    };

    // Explicit routing table: each protected group declares the permission
    // it requires and where its scope target comes from.
    let role_admin_requirement =
        AccessRequirement::global(PermissionId::parse(MANAGE_ROLES_PERMISSION)?);
    let assignment_admin_requirement =
        AccessRequirement::global(PermissionId::parse(MANAGE_ASSIGNMENTS_PERMISSION)?);

    let role_routes = Router::new()
        .route(
            "/api/security/roles",
            get(handlers::security::list_roles_handler)
                .post(handlers::security::create_role_handler),
        )
        .route(
            "/api/security/roles/{role_id}/permissions",
            post(handlers::security::grant_role_permission_handler),
        )
        .route(
            "/api/security/roles/{role_id}/permission-revocations",
            post(handlers::security::revoke_role_permission_handler),
        )
        .route(
            "/api/security/roles/{role_id}/deactivate",
            post(handlers::security::deactivate_role_handler),
        )
        .route(
            "/api/security/roles/{role_id}",
            delete(handlers::security::delete_role_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::enforce_access,
        ))
        .layer(Extension(role_admin_requirement));

    let assignment_routes = Router::new()
        .route(
            "/api/security/assignments",
            get(handlers::security::list_assignments_handler)
                .post(handlers::security::grant_assignment_handler),
        )
        .route(
            "/api/security/assignment-revocations",
            post(handlers::security::revoke_assignment_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::enforce_access,
        ))
        .layer(Extension(assignment_admin_requirement));

    let protected_routes = Router::new()
        .route(
            "/api/authorize",
            post(handlers::authorize::authorize_handler),
        )
        .merge(role_routes)
        .merge(assignment_routes)
        .route_layer(from_fn(middleware::require_identity));

    let cors_layer = CorsLayer::new()
        .allow_origin(HeaderValue::from_str(&allowed_origin).map_err(|error| {
            AppError::Internal(format!("invalid ALLOWED_ORIGIN: {error}"))
        })?)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "sitebeam-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
