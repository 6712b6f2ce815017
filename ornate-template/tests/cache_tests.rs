use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::FutureExt;
use ornate_template::{
    FailurePolicy, FetchError, Fetcher, MemoryFetcher, Node, TemplateCache, TreeBuilder,
};

fn fetcher() -> MemoryFetcher {
    MemoryFetcher::new()
        .with("card.html", "<div class=\"card\">{{ title }}</div>")
        .with_delay(Duration::from_millis(20))
}

#[tokio::test]
async fn concurrent_loads_share_one_fetch() {
    let cache = TemplateCache::default();
    let fetcher = fetcher();
    let builder = RefCell::new(TreeBuilder::default());

    let (a, b, c) = futures::join!(
        cache.load_with("card.html", &fetcher, &builder),
        cache.load_with("card.html", &fetcher, &builder),
        cache.load_with("card.html", &fetcher, &builder),
    );
    let (a, b, c) = (a.expect("a"), b.expect("b"), c.expect("c"));

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(cache.fetch_count(), 1);
    assert!(Rc::ptr_eq(&a, &b) && Rc::ptr_eq(&b, &c));
    assert_eq!(a[0].as_element().map(|e| e.tag.as_str()), Some("div"));
}

#[tokio::test]
async fn later_loads_hit_the_cache() {
    let cache = TemplateCache::default();
    let fetcher = fetcher();
    let builder = RefCell::new(TreeBuilder::default());

    let first = cache.load_with("card.html", &fetcher, &builder).await.expect("first");
    let second = cache.load_with("card.html", &fetcher, &builder).await.expect("second");
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(fetcher.calls(), 1);
    assert!(cache.get("card.html").is_some());
}

#[tokio::test]
async fn retry_policy_forgets_failures() {
    let cache = TemplateCache::new(FailurePolicy::Retry);
    let fetcher = MemoryFetcher::new();
    let builder = RefCell::new(TreeBuilder::default());

    let err = cache.load_with("late.html", &fetcher, &builder).await.unwrap_err();
    assert_eq!(err.id, "late.html");
    assert_eq!(err.source, FetchError::NotFound("late.html".into()));
    assert!(cache.is_empty());

    fetcher.insert("late.html", "<p>now</p>");
    let nodes = cache.load_with("late.html", &fetcher, &builder).await.expect("retry");
    assert_eq!(nodes.len(), 1);
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn sticky_policy_remembers_failures() {
    let cache = TemplateCache::new(FailurePolicy::Sticky);
    let fetcher = MemoryFetcher::new();
    let builder = RefCell::new(TreeBuilder::default());

    assert!(cache.load_with("gone.html", &fetcher, &builder).await.is_err());
    fetcher.insert("gone.html", "<p>too late</p>");
    let err = cache.load_with("gone.html", &fetcher, &builder).await.unwrap_err();
    assert_eq!(err.source, FetchError::NotFound("gone.html".into()));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn a_dropped_load_releases_the_pending_entry() {
    let cache = TemplateCache::default();
    let fetcher = fetcher();
    let builder = RefCell::new(TreeBuilder::default());

    let mut first = Box::pin(cache.load_with("card.html", &fetcher, &builder));
    assert!((&mut first).now_or_never().is_none());
    assert!(cache.is_pending("card.html"));
    drop(first);
    assert!(!cache.is_pending("card.html"));

    let nodes = cache.load_with("card.html", &fetcher, &builder).await.expect("reload");
    assert_eq!(nodes.len(), 1);
    assert_eq!(cache.fetch_count(), 2);
}

#[tokio::test]
async fn load_accepts_any_fetch_future() {
    let cache = TemplateCache::default();
    let nodes = cache
        .load("inline", || async { Ok(vec![Node::text("hi")]) })
        .await
        .expect("inline");
    assert_eq!(nodes[0].as_text(), Some("hi"));

    let fetcher: &dyn Fetcher = &MemoryFetcher::new().with("x", "y");
    assert_eq!(fetcher.fetch("x").await.as_deref(), Ok("y"));
}
