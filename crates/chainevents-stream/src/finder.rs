//! `HistoryFinder`: bounded historical retrieval.

use std::sync::Arc;

use chainevents_core::{client::ChainClient, error::EventError, event::DecodedEvent};
use chainevents_evm::{EventRequest, LogDecoder};
use tracing::debug;

/// One historical query. Holds only its immutable request, so any number
/// of finders can run concurrently against the same client.
pub struct HistoryFinder {
    client: Arc<dyn ChainClient>,
    request: EventRequest,
    decoder: LogDecoder,
}

impl HistoryFinder {
    pub fn new(client: Arc<dyn ChainClient>, request: EventRequest) -> Self {
        let decoder = LogDecoder::new(Arc::clone(&request.abi));
        Self {
            client,
            request,
            decoder,
        }
    }

    pub fn request(&self) -> &EventRequest {
        &self.request
    }

    /// Query the closed block range and decode every record in node order.
    ///
    /// Transport errors are returned unchanged. A single record that fails
    /// to decode fails the whole call; no partial list is returned.
    pub async fn find(&self) -> Result<Vec<DecodedEvent>, EventError> {
        let filter = self.request.historical_filter()?;
        let raws = self.client.filter_logs(&filter).await?;
        debug!(
            endpoint = self.client.endpoint(),
            records = raws.len(),
            from = ?filter.from_block,
            to = ?filter.to_block,
            "historical query returned"
        );
        Ok(self.decoder.decode_batch(&raws)?)
    }
}
