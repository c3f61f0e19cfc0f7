//! `chainevents history` and `chainevents watch`: commands that talk to a node.

use anyhow::{Context, Result};
use chainevents_core::filter::BlockRange;
use chainevents_stream::{EventFactory, SubscriberState};
use tracing::info;

use crate::args;
use crate::config::AppConfig;
use crate::output;
use crate::QueryArgs;

pub async fn history(app: &AppConfig, query: &QueryArgs, range: BlockRange) -> Result<()> {
    let chain = app.chain(query.rpc.as_deref(), None)?;
    // history needs no WebSocket, so don't dial one
    let chain = chainevents_stream::ChainConfig {
        websocket: None,
        ..chain
    };
    let factory = EventFactory::connect(&chain, app.stream.clone())
        .await
        .context("connect to node")?;

    let abi = args::load_abi(&query.abi)?;
    let request = args::build_request(
        abi,
        &query.address,
        query.event.as_deref(),
        &query.constraints,
    )?
    .block_range(range);

    let events = factory
        .history_finder(request)
        .find()
        .await
        .context("historical query failed")?;
    for event in &events {
        output::print_event(event, query.json)?;
    }
    info!(count = events.len(), "history done");
    Ok(())
}

pub async fn watch(app: &AppConfig, query: &QueryArgs, ws: Option<&str>) -> Result<()> {
    let chain = app.chain(query.rpc.as_deref(), ws)?;
    if chain.websocket.is_none() {
        anyhow::bail!("watch needs a WebSocket endpoint: pass --ws or set `chain.websocket`");
    }
    let factory = EventFactory::connect(&chain, app.stream.clone())
        .await
        .context("connect to node")?;

    let abi = args::load_abi(&query.abi)?;
    let request = args::build_request(
        abi,
        &query.address,
        query.event.as_deref(),
        &query.constraints,
    )?;

    let mut subscriber = factory.subscriber(request);
    let (mut events, mut errors) = subscriber.subscribe().await.context("subscribe")?;
    eprintln!("watching, Ctrl-C to stop");

    let mut errors_open = true;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(event) => output::print_event(&event, query.json)?,
                None => break,
            },
            error = errors.recv(), if errors_open => match error {
                Some(error) => eprintln!("error: {error}"),
                None => errors_open = false,
            },
        }
    }

    subscriber.unsubscribe();
    subscriber.closed().await;
    let metrics = subscriber.metrics();
    info!(
        decoded = metrics.events_decoded,
        decode_errors = metrics.decode_errors,
        transport_errors = metrics.transport_errors,
        "watch stopped"
    );
    if let SubscriberState::Closed(reason) = subscriber.state() {
        eprintln!("subscription closed: {reason:?}");
    }
    Ok(())
}
