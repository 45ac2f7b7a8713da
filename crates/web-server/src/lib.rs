use axum::{
    Router,
    routing::{get, post},
};
use stats_cache::StatsCacheManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub manager: StatsCacheManager,
}

/// Builds the application routes around the given state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route(
            "/api/users/:user_id/accounts/:account_id/stats",
            get(handlers::get_all_stats),
        )
        .route(
            "/api/users/:user_id/accounts/:account_id/stats/invalidate",
            post(handlers::invalidate_stats),
        )
        .route(
            "/api/users/:user_id/accounts/:account_id/stats/:period",
            get(handlers::get_period_stats),
        )
        .route(
            "/api/users/:user_id/accounts/:account_id/stats/:period/status",
            get(handlers::get_cache_status),
        )
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Binds the listener and serves the API until the process is stopped.
pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::PeriodStats;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use chrono::{NaiveDate, TimeZone, Utc};
    use configuration::StatsCacheSettings;
    use core_types::{JournalEntry, Period, TradeEntry};
    use database::{DbError, InMemoryCacheStore, InMemoryRecordStore, RecordFilter, RecordStore};
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use stats_cache::ManualClock;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct TestApp {
        user: Uuid,
        account: Uuid,
        router: Router,
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn app_with(settings: StatsCacheSettings) -> TestApp {
        let user = Uuid::new_v4();
        let account = Uuid::new_v4();
        let journal = InMemoryRecordStore::with_records(vec![
            JournalEntry::new(user, account, day(3), dec!(200), 4, 3, 1),
            JournalEntry::new(user, account, day(12), dec!(100), 1, 1, 0),
        ]);
        let trades = InMemoryRecordStore::with_records(vec![TradeEntry::new(
            user,
            account,
            day(12),
            dec!(100),
        )]);
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 12, 9, 0, 0).unwrap());

        let manager = StatsCacheManager::new(
            Arc::new(journal),
            Arc::new(trades),
            Arc::new(InMemoryCacheStore::new()),
            settings,
        )
        .with_clock(Arc::new(clock));

        TestApp {
            user,
            account,
            router: router(Arc::new(AppState { manager })),
        }
    }

    fn app() -> TestApp {
        app_with(StatsCacheSettings::default())
    }

    impl TestApp {
        fn stats_uri(&self, suffix: &str) -> String {
            format!(
                "/api/users/{}/accounts/{}/stats{suffix}",
                self.user, self.account
            )
        }

        async fn send(&self, method: Method, uri: String) -> (StatusCode, Vec<u8>) {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, body.to_vec())
        }
    }

    #[tokio::test]
    async fn health_check_responds() {
        let app = app();
        let (status, body) = app.send(Method::GET, "/api/health".to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn period_stats_are_served_as_json() {
        let app = app();

        let (status, body) = app.send(Method::GET, app.stats_uri("/today")).await;
        assert_eq!(status, StatusCode::OK);
        let stats: PeriodStats = serde_json::from_slice(&body).unwrap();
        assert_eq!(stats.period, Period::Today);
        assert_eq!(stats.total_pnl, dec!(100));

        let (status, body) = app.send(Method::GET, app.stats_uri("/ALL_TIME")).await;
        assert_eq!(status, StatusCode::OK);
        let stats: PeriodStats = serde_json::from_slice(&body).unwrap();
        assert_eq!(stats.total_pnl, dec!(300));
        assert_eq!(stats.equity_curve.len(), 2);
    }

    #[tokio::test]
    async fn all_stats_follow_configured_order() {
        let app = app();
        let (status, body) = app.send(Method::GET, app.stats_uri("")).await;

        assert_eq!(status, StatusCode::OK);
        let stats: Vec<PeriodStats> = serde_json::from_slice(&body).unwrap();
        let periods: Vec<Period> = stats.iter().map(|s| s.period).collect();
        assert_eq!(periods, Period::ALL.to_vec());
    }

    #[tokio::test]
    async fn unknown_and_disabled_periods_are_bad_requests() {
        let app = app_with(StatsCacheSettings {
            periods: vec![Period::AllTime],
            ..StatsCacheSettings::default()
        });

        let (status, _) = app.send(Method::GET, app.stats_uri("/YEAR")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app.send(Method::GET, app.stats_uri("/WEEK")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert!(error["error"].as_str().unwrap().contains("WEEK"));
    }

    #[tokio::test]
    async fn status_is_not_found_until_a_value_is_cached() {
        let app = app();

        let (status, _) = app.send(Method::GET, app.stats_uri("/WEEK/status")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        app.send(Method::GET, app.stats_uri("/WEEK")).await;
        let (status, body) = app.send(Method::GET, app.stats_uri("/WEEK/status")).await;
        assert_eq!(status, StatusCode::OK);
        let cache_status: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(cache_status["state"], "fresh");
        assert_eq!(cache_status["age_seconds"], 0);
    }

    #[tokio::test]
    async fn invalidate_returns_every_refreshed_record() {
        let app = app();

        let (status, body) = app.send(Method::POST, app.stats_uri("/invalidate")).await;
        assert_eq!(status, StatusCode::OK);
        let records: Value = serde_json::from_slice(&body).unwrap();
        let records = records.as_array().unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r["user_id"] == app.user.to_string()));
    }

    struct OfflineStore;

    #[async_trait]
    impl RecordStore<JournalEntry> for OfflineStore {
        async fn filter(&self, _: &RecordFilter) -> Result<Vec<JournalEntry>, DbError> {
            Err(DbError::InvalidData("password=hunter2".to_string()))
        }

        async fn create(&self, _: JournalEntry) -> Result<JournalEntry, DbError> {
            Err(DbError::NotFound)
        }

        async fn update(&self, _: Uuid, _: JournalEntry) -> Result<JournalEntry, DbError> {
            Err(DbError::NotFound)
        }
    }

    #[tokio::test]
    async fn store_failures_return_a_generic_server_error() {
        let manager = StatsCacheManager::new(
            Arc::new(OfflineStore),
            Arc::new(InMemoryRecordStore::<TradeEntry>::new()),
            Arc::new(InMemoryCacheStore::new()),
            StatsCacheSettings::default(),
        );
        let app = TestApp {
            user: Uuid::new_v4(),
            account: Uuid::new_v4(),
            router: router(Arc::new(AppState { manager })),
        };

        let (status, body) = app.send(Method::GET, app.stats_uri("/TODAY")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!String::from_utf8(body).unwrap().contains("hunter2"));
    }
}
