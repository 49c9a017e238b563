//! Tests querying the public internet, run with
//! `cargo test --features functional_tests`.
#![cfg(feature = "functional_tests")]

use fetchonce::{fetch_once, ErrorKind, FetchOnce, Session};

#[async_std::test]
async fn test_https_query() {
    let mut session = Session::new().unwrap();
    let response = session.get("https://www.rust-lang.org/").await.unwrap();
    session.close();
    assert_eq!(response.status_code(), 200);
    assert!(response.body_as_string().unwrap().contains("Rust"));
}

#[async_std::test]
async fn test_fetch_profile() {
    let mut fetch = FetchOnce::new();
    match fetch.run().await {
        Ok(value) => assert!(value.is_object() || value.is_array()),
        // the host may be gone, the request itself must be valid
        Err(err) => assert_ne!(err.kind(), ErrorKind::Request, "{}", err),
    }
}

#[async_std::test]
async fn test_fetch_once() {
    if let Err(err) = fetch_once().await {
        assert_ne!(err.kind(), ErrorKind::Request, "{}", err);
    }
}
