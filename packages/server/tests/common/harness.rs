//! Test harness with testcontainers for integration testing.
//!
//! Containers are started once per test binary and shared; each test gets
//! a fresh pool and Redis connection. Tests isolate themselves by using a
//! unique company id.

use anyhow::{Context, Result};
use careers_core::common::CompanyId;
use careers_core::domains::postings::PgProductionLedger;
use careers_core::domains::selectors::PgCompanyConfigStore;
use careers_core::kernel::test_dependencies::{MockAI, MockRenderer};
use careers_core::kernel::{RedisCache, ServerDeps};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::redis::Redis;
use tokio::sync::OnceCell;

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    db_url: String,
    redis_url: String,
    // Keep containers alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
    _redis: ContainerAsync<Redis>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --ignored --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let redis = Redis::default()
            .start()
            .await
            .context("Failed to start Redis container")?;

        let redis_host = redis.get_host().await?;
        let redis_port = redis.get_host_port_ipv4(6379).await?;
        let redis_url = format!("redis://{}:{}", redis_host, redis_port);

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            redis_url,
            _postgres: postgres,
            _redis: redis,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Real Postgres + Redis, with the renderer and model left to doubles.
///
/// ```ignore
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// #[ignore = "requires a container runtime"]
/// async fn my_test(ctx: &mut TestHarness) {
///     let deps = ctx.server_deps(MockAI::new(), MockRenderer::new());
/// }
/// ```
pub struct TestHarness {
    pub db_pool: PgPool,
    pub cache: Arc<RedisCache>,
    /// Unique per test
    pub company_id: CompanyId,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;
        let cache = RedisCache::connect(&infra.redis_url).await?;
        let company_id = CompanyId::parse(&format!("company-{}", uuid::Uuid::new_v4()))?;

        Ok(Self {
            db_pool,
            cache: Arc::new(cache),
            company_id,
        })
    }

    pub fn server_deps(&self, ai: MockAI, renderer: MockRenderer) -> ServerDeps {
        ServerDeps::new(
            Arc::new(ai),
            Arc::new(renderer),
            self.cache.clone(),
            Arc::new(PgCompanyConfigStore::new(self.db_pool.clone())),
            Arc::new(PgProductionLedger::new(self.db_pool.clone())),
        )
        .with_render_timeout(Duration::from_secs(5))
    }
}
