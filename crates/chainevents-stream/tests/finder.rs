mod common;

use std::sync::Arc;

use chainevents_core::error::{DecodeError, EventError, TransportError};
use chainevents_core::filter::{BlockNumber, BlockRange};
use chainevents_core::types::NormalizedValue;
use chainevents_stream::HistoryFinder;
use common::*;

#[tokio::test]
async fn find_decodes_in_node_order() {
    let client = Arc::new(MockChainClient::with_history(vec![
        transfer_log(10, 0, 1),
        transfer_log(10, 1, 2),
        transfer_log(11, 0, 3),
    ]));
    let finder = HistoryFinder::new(
        client.clone(),
        transfer_request().block_range(BlockRange::new(10, 11)),
    );

    let events = finder.find().await.unwrap();
    let values: Vec<_> = events.iter().map(|e| e.field("value").cloned()).collect();
    assert_eq!(
        values,
        vec![
            Some(NormalizedValue::Uint(1)),
            Some(NormalizedValue::Uint(2)),
            Some(NormalizedValue::Uint(3)),
        ]
    );
    assert_eq!(events[2].block_number, 11);

    let filter = client.last_filter();
    assert_eq!(filter.from_block, Some(BlockNumber::Number(10)));
    assert_eq!(filter.to_block, Some(BlockNumber::Number(11)));
    assert_eq!(filter.addresses, vec![token()]);
}

#[tokio::test]
async fn find_without_range_spans_everything() {
    let client = Arc::new(MockChainClient::with_history(vec![]));
    let finder = HistoryFinder::new(client.clone(), transfer_request());
    assert!(finder.find().await.unwrap().is_empty());

    let filter = client.last_filter();
    assert_eq!(filter.from_block, Some(BlockNumber::Earliest));
    assert_eq!(filter.to_block, Some(BlockNumber::Latest));
}

#[tokio::test]
async fn one_bad_record_fails_the_whole_query() {
    let client = Arc::new(MockChainClient::with_history(vec![
        transfer_log(1, 0, 1),
        unknown_log(),
        transfer_log(1, 2, 3),
    ]));
    let finder = HistoryFinder::new(client, transfer_request());
    match finder.find().await {
        Err(EventError::Decode(DecodeError::UnknownEvent { .. })) => {}
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_error_passes_through() {
    let client = Arc::new(MockChainClient::failing_history("node down"));
    let finder = HistoryFinder::new(client, transfer_request());
    match finder.find().await {
        Err(EventError::Transport(TransportError::Http(m))) => assert_eq!(m, "node down"),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_event_name_fails_before_querying() {
    let client = Arc::new(MockChainClient::with_history(vec![]));
    let request = chainevents_evm::EventRequest::new(abi())
        .event(chainevents_core::filter::EventDescription::new("Approval"));
    let finder = HistoryFinder::new(client.clone(), request);
    assert!(matches!(finder.find().await, Err(EventError::Filter(_))));
    assert!(client.filters.lock().unwrap().is_empty());
}
