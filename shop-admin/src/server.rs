//! The HTTP front end.
//!
//! | Route           | Description                                  |
//! |-----------------|----------------------------------------------|
//! | `POST /graphql` | Execute a GraphQL request.                   |
//! | `GET /graphql`  | The GraphQL playground.                      |
//! | `GET /health`   | Liveness check; does not touch the database. |

use crate::graphql::{self, ShopSchema, Store};
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

async fn graphql_handler(State(schema): State<ShopSchema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "OK",
        "message": "Server is running",
    }))
}

/// The application routes, serving data from `store`.
pub fn app(store: Store) -> Router {
    Router::new()
        .route("/graphql", get(graphql_playground).post(graphql_handler))
        .route("/health", get(health))
        .with_state(graphql::schema(store))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Check the database and build the application routes.
///
/// A failed check is logged but does not prevent serving: requests which need the database report
/// an error until it becomes reachable.
pub async fn startup(store: Store) -> Router {
    match store.ping().await {
        Ok(()) => tracing::info!("database connection established"),
        Err(err) => tracing::error!("database connection failed: {err}"),
    }
    app(store)
}

/// Serve the API on `port` until interrupted.
pub async fn run(store: Store, port: u16) -> color_eyre::Result<()> {
    let app = startup(store).await;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let server = axum::Server::try_bind(&addr)?.serve(app.into_make_service());
    tracing::info!("server listening on http://{}", server.local_addr());
    tracing::info!("GraphQL endpoint at http://{}/graphql", server.local_addr());

    server.with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        // Without a signal handler there is nothing to wait for; keep serving.
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::DbOptions;
    use crate::init_logging;
    use crate::sql::seed;
    use axum::http::{header, Method, Request, StatusCode};
    use hyper::{body::HttpBody, Body};
    use std::fmt::Debug;
    use tower::ServiceExt;

    async fn seeded() -> Router {
        init_logging();
        app(Store::new(seed::in_memory().await.unwrap()))
    }

    async fn json_body<B: HttpBody>(body: B) -> serde_json::Value
    where
        B::Error: Debug,
    {
        let bytes = hyper::body::to_bytes(body).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let res = seeded()
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            json_body(res.into_body()).await,
            serde_json::json!({"status": "OK", "message": "Server is running"})
        );
    }

    #[tokio::test]
    async fn test_graphql_post() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/graphql")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({
                    "query": "query($id: ID!) { customer(customer_id: $id) { email } }",
                    "variables": {"id": "3"},
                })
                .to_string(),
            ))
            .unwrap();
        let res = seeded().await.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            json_body(res.into_body()).await,
            serde_json::json!({"data": {"customer": {"email": "mike.j@email.com"}}})
        );
    }

    #[tokio::test]
    async fn test_playground() {
        let res = seeded()
            .await
            .oneshot(Request::get("/graphql").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let page = hyper::body::to_bytes(res.into_body()).await.unwrap();
        assert!(String::from_utf8_lossy(&page).contains("GraphQL Playground"));
    }

    #[tokio::test]
    async fn test_cors() {
        let req = Request::get("/health")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let res = seeded().await.oneshot(req).await.unwrap();
        assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_database_unreachable() {
        init_logging();
        // Nothing listens on port 1.
        let db = DbOptions {
            host: "localhost".into(),
            port: 1,
            user: "postgres".into(),
            password: String::new(),
            name: "shop_shine".into(),
        };
        let app = startup(Store::new(db.data_source())).await;

        let res = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/graphql")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({"query": "{ categories { category_id } }"}).to_string(),
            ))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res.into_body()).await;
        let message = body["errors"][0]["message"].as_str().unwrap();
        assert!(message.contains("error connecting to PostgreSQL"), "{message}");
    }
}
