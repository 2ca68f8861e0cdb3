use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::ApiError;
use crate::handlers::{auth, company, health, user};
use crate::middleware::{jwt_auth_middleware, require_roles, ADMIN_ONLY};
use crate::state::AppState;

/// Full HTTP surface. Used by the binary and by the integration tests.
pub fn app(state: AppState) -> Router {
    let cors = if state.config.server.enable_cors {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        // Public
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // Protected (JWT)
        .merge(protected_routes(state.clone()))
        .fallback(fallback)
        // Global middleware
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

/// Every route here requires a valid token. Method handlers registered before
/// `route_layer(admin())` additionally require the ADMIN role.
fn protected_routes(state: AppState) -> Router<AppState> {
    let admin = || middleware::from_fn_with_state(ADMIN_ONLY, require_roles);

    Router::new()
        .route(
            "/user",
            get(user::list)
                .delete(user::delete_self)
                .route_layer(admin())
                .put(user::update_self),
        )
        .route(
            "/user/:uid",
            get(user::get).put(user::update).route_layer(admin()),
        )
        .route(
            "/company",
            get(company::list).post(company::create).route_layer(admin()),
        )
        .route("/company/report/excel", get(company::report).route_layer(admin()))
        .route(
            "/company/:id",
            get(company::get)
                .put(company::update)
                .delete(company::delete)
                .route_layer(admin()),
        )
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

async fn fallback() -> ApiError {
    ApiError::not_found("Route not found")
}
