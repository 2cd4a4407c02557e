mod common;

use common::{client, json, status, url, with_header, MockTransport};
use http::Method;
use ketting_rs::{RequestOptions, ResourceEvent};
use serde_json::json;
use tokio::sync::broadcast::error::TryRecvError;

#[tokio::test]
async fn test_delete_invalidates_linked_resources() {
    let mock = MockTransport::new();
    mock.on(Method::GET, "/foo", |_| json(json!({"foo": true})));
    mock.on(Method::GET, "/bar", |_| json(json!({"bar": true})));
    mock.on(Method::DELETE, "/foo", |_| {
        with_header(status(204), "link", r#"</bar>; rel="invalidates""#)
    });
    let client = client(&mock);

    let foo = client.go("/foo").unwrap();
    let bar = client.go("/bar").unwrap();
    foo.get(RequestOptions::default()).await.unwrap();
    bar.get(RequestOptions::default()).await.unwrap();
    assert!(client.cache().has(&url("/foo")));
    assert!(client.cache().has(&url("/bar")));

    let mut foo_events = foo.subscribe();
    let mut bar_events = bar.subscribe();
    foo.delete().await.unwrap();

    assert!(!client.cache().has(&url("/foo")));
    assert!(!client.cache().has(&url("/bar")));
    assert!(matches!(foo_events.try_recv(), Ok(ResourceEvent::Delete)));
    assert!(matches!(bar_events.try_recv(), Ok(ResourceEvent::Stale)));

    // the next get goes back to the network
    bar.get(RequestOptions::default()).await.unwrap();
    assert_eq!(mock.count(Method::GET, "/bar"), 2);
}

#[tokio::test]
async fn test_safe_methods_do_not_invalidate() {
    let mock = MockTransport::new();
    mock.on(Method::GET, "/foo", |_| {
        with_header(json(json!({})), "link", r#"</bar>; rel="invalidates""#)
    });
    mock.on(Method::GET, "/bar", |_| json(json!({})));
    let client = client(&mock);

    let bar = client.go("/bar").unwrap();
    bar.get(RequestOptions::default()).await.unwrap();
    client
        .go("/foo")
        .unwrap()
        .refresh(RequestOptions::default())
        .await
        .unwrap();

    assert!(client.cache().has(&url("/bar")));
}

#[tokio::test]
async fn test_post_location_is_stale() {
    let mock = MockTransport::new();
    mock.on(Method::GET, "/list", |_| json(json!([])));
    mock.on(Method::GET, "/list/1", |_| json(json!({})));
    mock.on(Method::POST, "/list", |_| {
        with_header(status(201), "location", "/list/1")
    });
    let client = client(&mock);

    let list = client.go("/list").unwrap();
    let item = client.go("/list/1").unwrap();
    list.get(RequestOptions::default()).await.unwrap();
    item.get(RequestOptions::default()).await.unwrap();

    let mut item_events = item.subscribe();
    let mut list_events = list.subscribe();
    list.post(RequestOptions::new().with_json(&json!({"name": "x"})))
        .await
        .unwrap();

    assert!(!client.cache().has(&url("/list")));
    assert!(!client.cache().has(&url("/list/1")));
    assert!(matches!(list_events.try_recv(), Ok(ResourceEvent::Stale)));
    assert!(matches!(item_events.try_recv(), Ok(ResourceEvent::Stale)));
}

#[tokio::test]
async fn test_content_location_is_cached() {
    let mock = MockTransport::new();
    mock.on(Method::PATCH, "/doc", |_| {
        with_header(json(json!({"patched": true})), "content-location", "/doc/v2")
    });
    let client = client(&mock);

    let v2 = client.go("/doc/v2").unwrap();
    let mut events = v2.subscribe();
    client
        .go("/doc")
        .unwrap()
        .patch(RequestOptions::new().with_json(&json!({"patched": true})))
        .await
        .unwrap();

    let cached = client.cache().get(&url("/doc/v2")).unwrap();
    assert_eq!(cached.data.as_json(), Some(&json!({"patched": true})));
    match events.try_recv() {
        Ok(ResourceEvent::Update(state)) => assert_eq!(state.uri.as_str(), url("/doc/v2")),
        other => panic!("expected update, got {:?}", other),
    }

    // served from cache
    v2.get(RequestOptions::default()).await.unwrap();
    assert_eq!(mock.count(Method::GET, "/doc/v2"), 0);
}

#[tokio::test]
async fn test_content_location_no_store() {
    let mock = MockTransport::new();
    mock.on(Method::PATCH, "/doc", |_| {
        let response = with_header(json(json!({})), "content-location", "/doc/v2");
        with_header(response, "cache-control", "private, no-store")
    });
    let client = client(&mock);

    let v2 = client.go("/doc/v2").unwrap();
    let mut events = v2.subscribe();
    client
        .go("/doc")
        .unwrap()
        .patch(RequestOptions::new().with_body("{}"))
        .await
        .unwrap();

    assert!(!client.cache().has(&url("/doc/v2")));
    assert!(matches!(events.try_recv(), Ok(ResourceEvent::Stale)));
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_clear_resource_cache_notifies_live_resources() {
    let mock = MockTransport::new();
    mock.on(Method::GET, "/a", |_| json(json!({})));
    let client = client(&mock);
    let a = client.go("/a").unwrap();
    a.get(RequestOptions::default()).await.unwrap();

    let mut events = a.subscribe();
    client.clear_resource_cache(&[url("/a")], &[]);
    assert!(matches!(events.try_recv(), Ok(ResourceEvent::Stale)));
    assert!(!client.cache().has(&url("/a")));
}
