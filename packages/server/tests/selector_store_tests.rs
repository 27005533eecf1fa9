//! SelectorStore against real Postgres + Redis.

mod common;

use careers_core::domains::selectors::{
    selector_cache_key, CompanyConfig, SelectorConfig, SelectorStore,
};
use careers_core::kernel::test_dependencies::{MockAI, MockRenderer};
use careers_core::kernel::BaseKeyValueCache;
use common::TestHarness;
use test_context::test_context;
use url::Url;

fn pinned() -> SelectorConfig {
    SelectorConfig {
        job_container: "li.vacancy".into(),
        title: ".name".into(),
        link: "a.more".into(),
        location: Some(".city".into()),
        description: None,
    }
}

fn store(ctx: &TestHarness) -> SelectorStore {
    ctx.server_deps(MockAI::new(), MockRenderer::new()).selector_store()
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires a container runtime"]
async fn save_writes_both_tiers(ctx: &mut TestHarness) {
    let store = store(ctx);

    store.save_selectors(&ctx.company_id, &pinned()).await.unwrap();

    let row = CompanyConfig::find_by_company_id(ctx.company_id.as_str(), &ctx.db_pool)
        .await
        .unwrap()
        .expect("row created on first write");
    assert_eq!(row.overrides().unwrap().job_container.as_deref(), Some("li.vacancy"));
    assert!(row.careers_page_url.is_none());

    let cached = store.cached_selectors(&ctx.company_id).await.unwrap();
    assert_eq!(cached.title.as_deref(), Some(".name"));
    assert_eq!(cached.location.as_deref(), Some(".city"));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires a container runtime"]
async fn save_is_idempotent(ctx: &mut TestHarness) {
    let store = store(ctx);

    let first = store.save_selectors(&ctx.company_id, &pinned()).await.unwrap();
    let second = store.save_selectors(&ctx.company_id, &pinned()).await.unwrap();

    assert_eq!(first.override_selectors, second.override_selectors);
    assert_eq!(first.company_id, second.company_id);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires a container runtime"]
async fn canonical_url_is_only_backfilled_once(ctx: &mut TestHarness) {
    let store = store(ctx);
    let first = Url::parse("https://jobs.example.test/open").unwrap();
    let second = Url::parse("https://example.test/other").unwrap();

    store.backfill_canonical_url(&ctx.company_id, &first).await.unwrap();
    let row = store.backfill_canonical_url(&ctx.company_id, &second).await.unwrap();

    assert_eq!(row.canonical_url(), Some(first.as_str()));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires a container runtime"]
async fn overrides_and_canonical_url_are_independent(ctx: &mut TestHarness) {
    let store = store(ctx);
    let canonical = Url::parse("https://jobs.example.test/open").unwrap();

    store.backfill_canonical_url(&ctx.company_id, &canonical).await.unwrap();
    let row = store.save_selectors(&ctx.company_id, &pinned()).await.unwrap();

    assert_eq!(row.canonical_url(), Some(canonical.as_str()));
    assert!(row.overrides().is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires a container runtime"]
async fn malformed_cache_entry_reads_as_absent(ctx: &mut TestHarness) {
    let store = store(ctx);

    ctx.cache
        .set(&selector_cache_key(&ctx.company_id), "{not json")
        .await
        .unwrap();

    assert!(store.cached_selectors(&ctx.company_id).await.is_none());
}
