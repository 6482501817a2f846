#![cfg(all(feature = "reqwest-client", not(target_arch = "wasm32")))]

use std::time::Duration;

use event_ticket::config::ClientConfig;
use event_ticket::error::{ClientError, TransportError};
use event_ticket::session::DrupalClient;
use tokio::net::TcpListener;

#[tokio::test]
async fn reqwest_timeout_surfaces_as_timeout() {
    // Accepts the connection and never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        std::future::pending::<()>().await;
    });

    let config = ClientConfig::new()
        .endpoint(url::Url::parse(&format!("http://{addr}/api")).unwrap())
        .timeout(Duration::from_millis(200))
        .build();
    let drupal = DrupalClient::with_config(config).expect("transport builds");

    let err = drupal.login("alice", "secret").await.unwrap_err();
    assert!(
        matches!(err, ClientError::Transport(TransportError::Timeout)),
        "got {err:?}"
    );
    assert!(!drupal.is_logged_in().await);
}

#[tokio::test]
async fn bad_endpoint_string_is_a_request_error() {
    let Err(err) = DrupalClient::connect("::not a url::") else {
        panic!("endpoint should not parse");
    };
    assert!(err.is_request());
}
