//! End-to-end checks against the live service.
//!
//! Ignored by default. Provide `LTNM_USERNAME` and `LTNM_PASSWORD` (and
//! optionally `LTNM_SERVER_URL` / `LTNM_SERVER_PORT`), put the service CA
//! bundle at `cacert.pem`, then run `cargo test --test live -- --ignored`.

use std::time::Duration;

use ltnm_client_sdk::monitor::{MonitorConfig, PASSENGERS_DESTINATION};
use ltnm_client_sdk::stomp::{StompClient, StompClientError};
use ltnm_client_sdk::ws::{Config, WsTransport, tls};
use tokio::sync::mpsc;
use tokio::time::timeout;

#[derive(Debug, PartialEq, Eq)]
enum Event {
    Connect(StompClientError),
    Disconnect(StompClientError),
    Subscribe(StompClientError, String),
    Close(StompClientError),
}

#[tokio::test]
#[ignore = "requires live-service credentials"]
async fn connect_subscribe_close_against_the_live_service() {
    let config = MonitorConfig::from_env().expect("LTNM_* environment variables not set");
    let trust_store =
        tls::trust_store_from_pem(&config.ca_bundle).expect("cannot load the CA bundle");
    let transport = WsTransport::new(
        Config::new(config.url.as_str(), config.endpoint.as_str(), config.port),
        trust_store,
    );
    let client = StompClient::new(config.url.as_str(), transport);

    let (events_tx, mut events) = mpsc::unbounded_channel();

    // Receiving a message is not guaranteed (it depends on the time of
    // day), so the subscription confirmation closes the session.
    let closer = client.clone();
    let connect_tx = events_tx.clone();
    let disconnect_tx = events_tx.clone();
    let subscribe_tx = events_tx.clone();
    let subscriber = client.clone();
    client.connect(
        &config.username,
        &config.password,
        move |ec| {
            let _ = connect_tx.send(Event::Connect(ec));
            subscriber.subscribe(
                PASSENGERS_DESTINATION,
                move |ec, id| {
                    let _ = subscribe_tx.send(Event::Subscribe(ec, id));
                    let close_tx = events_tx.clone();
                    closer.close(move |ec| {
                        let _ = close_tx.send(Event::Close(ec));
                    });
                },
                |_, _| {},
            );
        },
        move |ec| {
            let _ = disconnect_tx.send(Event::Disconnect(ec));
        },
    );

    let connect = timeout(Duration::from_secs(30), events.recv())
        .await
        .expect("timed out connecting")
        .unwrap();
    assert_eq!(connect, Event::Connect(StompClientError::Ok));

    let subscribe = timeout(Duration::from_secs(30), events.recv())
        .await
        .expect("timed out subscribing")
        .unwrap();
    let Event::Subscribe(ec, id) = subscribe else {
        panic!("expected a subscription event, got {subscribe:?}");
    };
    assert_eq!(ec, StompClientError::Ok);
    assert!(!id.is_empty());

    let close = timeout(Duration::from_secs(30), events.recv())
        .await
        .expect("timed out closing")
        .unwrap();
    assert_eq!(close, Event::Close(StompClientError::Ok));
}
