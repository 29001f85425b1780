use axum::Router;
use tower_http::cors::CorsLayer;

use todo_api::core::auth::{AuthApiState, AuthService, JwtService, auth_api_router};
use todo_api::core::config::Config;
use todo_api::core::db::pool::DbConfig;
use todo_api::core::db::repositories::{TodoRepository, UserRepository};
use todo_api::core::todos::{TodoApiState, TodoService, todo_api_router};

#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Log config status (without revealing secrets)
    let config = Config::from_env();
    tracing::info!(
        "Config loaded: database={}, jwt_secret={}",
        config.has_database(),
        config.has_jwt_secret()
    );

    let db_config = DbConfig::from_env().expect("DATABASE_URL must be set");
    let pool = db_config
        .connect_and_migrate()
        .await
        .expect("Failed to connect to database");

    let jwt_service = JwtService::from_env().expect("JWT_SECRET must be set");

    let user_repo = UserRepository::new(pool.clone());
    let todo_repo = TodoRepository::new(pool);

    let auth_service = AuthService::new(user_repo, jwt_service.clone());
    let todo_service = TodoService::new(todo_repo);

    let app = Router::new()
        .merge(auth_api_router(AuthApiState { auth_service }))
        .merge(todo_api_router(TodoApiState {
            todo_service,
            jwt_service,
        }))
        .layer(CorsLayer::permissive());

    tracing::info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind server address");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}
