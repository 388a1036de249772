//! 应用装配：路由、CORS、请求追踪与监听。

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use tg_shared_protocol::{PROTECTED_EXAMPLE_ROUTE, TOKEN_ROUTE};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    auth::handlers::{example_handler, token_handler},
    config::AppConfig,
    state::AppState,
};

/// 服务入口：装配状态并启动 HTTP 监听。
pub(crate) async fn run(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    info!(
        issuer = %config.token.issuer,
        audience = %config.token.audience,
        secret_source = config.secret_source.as_str(),
        "token authority ready"
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    info!("tg-auth listening on {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// 构造路由。
pub(crate) fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .route("/healthz", get(healthz))
        .route(TOKEN_ROUTE, post(token_handler))
        .route(PROTECTED_EXAMPLE_ROUTE, get(example_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// 健康检查接口。
async fn healthz() -> &'static str {
    "ok"
}
