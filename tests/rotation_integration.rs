use std::time::Duration;

use collage_frame::events::ComposerCommand;
use collage_frame::surface::DisplayState;
use collage_frame::tasks::rotation;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const INTERVAL: Duration = Duration::from_millis(100);

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn active_rotation_requests_a_pass_each_interval() {
    let (tx, mut rx) = mpsc::channel::<ComposerCommand>(16);
    let shared = DisplayState::new();
    shared.set_rotation_active(true);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(rotation::run(shared, tx, INTERVAL, cancel.clone()));

    for _ in 0..3 {
        let cmd = timeout(Duration::from_millis(1000), rx.recv())
            .await
            .expect("no pass requested within the interval")
            .expect("scheduler dropped its channel");
        assert!(matches!(cmd, ComposerCommand::Compose));
    }

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn clearing_the_flag_silences_the_scheduler_within_one_interval() {
    let (tx, mut rx) = mpsc::channel::<ComposerCommand>(16);
    let shared = DisplayState::new();
    shared.set_rotation_active(true);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(rotation::run(shared.clone(), tx, INTERVAL, cancel.clone()));

    // Let at least one pass go out while active.
    timeout(Duration::from_millis(1000), rx.recv())
        .await
        .expect("no pass requested while active")
        .expect("scheduler dropped its channel");

    shared.set_rotation_active(false);
    // A wake already past the flag check may deliver one more request;
    // give it one interval to land, then drop whatever arrived.
    tokio::time::sleep(INTERVAL + INTERVAL / 2).await;
    while rx.try_recv().is_ok() {}

    // After the stop settles, the channel must stay silent.
    assert!(
        timeout(INTERVAL * 2, rx.recv()).await.is_err(),
        "pass requested after rotation was stopped"
    );

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn an_inactive_scheduler_never_requests_a_pass() {
    let (tx, mut rx) = mpsc::channel::<ComposerCommand>(16);
    let shared = DisplayState::new();
    // rotation_active stays false
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(rotation::run(shared, tx, INTERVAL, cancel.clone()));

    assert!(
        timeout(INTERVAL * 4, rx.recv()).await.is_err(),
        "pass requested while rotation was never started"
    );

    cancel.cancel();
    handle.await.unwrap().unwrap();
}
