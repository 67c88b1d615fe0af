//! The device-side heartbeat loop against a real listening server.

use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use signcast_backend::{
    client::heartbeat::HeartbeatClient,
    models::device::{ActiveImageInfo, RemoteCommand},
};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

mod support;

use support::{bearer_token_for, post_json, seed_user, test_context, test_router};

const WAIT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn heartbeat_loop_registers_device_and_delivers_commands() {
    let ctx = test_context();
    let app = test_router(&ctx);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    let (command_tx, mut command_rx) = mpsc::channel(16);
    let (image_tx, image_rx) = watch::channel(None::<ActiveImageInfo>);

    let client = HeartbeatClient::new(format!("http://{}", addr), "tv-hall")
        .with_interval(Duration::from_millis(100));
    let loop_handle = tokio::spawn(client.run(command_tx, image_rx));

    // The first beat fires immediately, registering the device.
    timeout(WAIT, async {
        loop {
            if ctx
                .state
                .devices
                .verify_device("tv-hall", Utc::now())
                .is_some()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("device registered via heartbeat");

    // A queued command arrives through the poll-drain fallback path.
    ctx.state
        .devices
        .enqueue_command("tv-hall", RemoteCommand::Refresh, Utc::now());
    let delivered = timeout(WAIT, command_rx.recv())
        .await
        .expect("command delivered")
        .expect("loop alive");
    assert_eq!(delivered, RemoteCommand::Refresh);

    // The loop reports what the display is showing.
    image_tx
        .send(Some(ActiveImageInfo {
            name: "promo.png".to_string(),
            url: "/promo.png".to_string(),
        }))
        .expect("update active image");
    timeout(WAIT, async {
        loop {
            let reported = ctx
                .state
                .devices
                .verify_device("tv-hall", Utc::now())
                .and_then(|status| status.active_image);
            if reported.as_ref().map(|image| image.name.as_str()) == Some("promo.png") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("active image reported via heartbeat");

    // Dropping the consumer stops the loop on the next delivery.
    drop(command_rx);
    ctx.state
        .devices
        .enqueue_command("tv-hall", RemoteCommand::Next, Utc::now());
    timeout(WAIT, loop_handle)
        .await
        .expect("loop stops once consumer is gone")
        .expect("loop task not panicked");
}

#[tokio::test]
async fn full_dispatch_round_trip_over_http() {
    let ctx = test_context();
    let app = test_router(&ctx);
    let user = seed_user(&ctx, "op@example.com", "hunter2").await;
    let token = bearer_token_for(&user);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let served = test_router(&ctx);
    tokio::spawn(async move {
        axum::serve(listener, served).await.expect("serve");
    });

    let (command_tx, mut command_rx) = mpsc::channel(16);
    let (_image_tx, image_rx) = watch::channel(None::<ActiveImageInfo>);
    let client = HeartbeatClient::new(format!("http://{}", addr), "tv-window")
        .with_interval(Duration::from_millis(100));
    tokio::spawn(client.run(command_tx, image_rx));

    // Operator dispatches through the API (in-process router is enough for
    // the dispatch side; the device side goes over the wire).
    let (status, _) = post_json(
        &app,
        "/api/remote/command",
        Some(&token),
        json!({
            "targetDeviceId": "tv-window",
            "command": {"type": "show-image", "data": {"name": "x.jpg", "url": "/x.jpg"}}
        }),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::ACCEPTED);

    let delivered = timeout(WAIT, command_rx.recv())
        .await
        .expect("command delivered")
        .expect("loop alive");
    assert_eq!(
        delivered,
        RemoteCommand::ShowImage {
            name: "x.jpg".to_string(),
            url: "/x.jpg".to_string()
        }
    );
}
