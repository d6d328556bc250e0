use std::time::Duration;

use conveyor::error::{Error, Result};
use conveyor::pipeline::cancel::CancelToken;
use conveyor::source::batch::BatchSource;
use tokio::time::timeout;

mod common;
use common::{items, FailingProvider, VecProvider};

#[tokio::test]
async fn emits_every_item_in_order() -> Result<()> {
    let provider = VecProvider::new(items(15));
    let (source, mut feed) = BatchSource::new(CancelToken::new(), provider, 5, 2);
    let handle = tokio::spawn(source.run());

    let mut seen = Vec::new();
    while let Some(item) = feed.recv().await {
        seen.push(item.id);
    }

    assert_eq!(seen, (0..15).collect::<Vec<_>>());
    handle.await??;
    Ok(())
}

#[tokio::test]
async fn empty_provider_closes_stream_on_first_call() -> Result<()> {
    let (source, mut feed) = BatchSource::new(CancelToken::new(), VecProvider::new(vec![]), 5, 2);
    let handle = tokio::spawn(source.run());

    assert!(feed.recv().await.is_none());
    handle.await??;
    Ok(())
}

#[tokio::test]
async fn short_final_batch_is_not_an_error() -> Result<()> {
    let provider = VecProvider::new(items(7));
    let (mut feed, handle) = BatchSource::spawn(CancelToken::new(), provider, 5, 4);

    let mut count = 0;
    while feed.recv().await.is_some() {
        count += 1;
    }

    assert_eq!(count, 7);
    handle.await??;
    Ok(())
}

#[tokio::test]
async fn provider_failure_stops_only_this_stage() -> Result<()> {
    let provider = FailingProvider::new(vec![items(5)]);
    let (source, mut feed) = BatchSource::new(CancelToken::new(), provider, 5, 8);
    let handle = tokio::spawn(source.run());

    // Everything fetched before the failure still arrives, then the stream
    // closes like ordinary exhaustion.
    let mut seen = 0;
    while feed.recv().await.is_some() {
        seen += 1;
    }
    assert_eq!(seen, 5);

    let res = handle.await?;
    assert!(matches!(res, Err(Error::Provider(_))));
    Ok(())
}

#[tokio::test]
async fn cancellation_stops_a_blocked_source() -> Result<()> {
    let cancel = CancelToken::new();
    let provider = VecProvider::new(items(100));
    let (source, feed) = BatchSource::new(cancel.clone(), provider, 10, 1);
    let handle = tokio::spawn(source.run());

    // Nobody drains the feed, so the source parks on its bounded send.
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    timeout(Duration::from_millis(500), handle)
        .await
        .expect("source should exit promptly after cancel")??;
    drop(feed);
    Ok(())
}
