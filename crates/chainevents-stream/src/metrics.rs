/// Counters for one subscriber's decode loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriberMetrics {
    pub events_decoded: u64,
    pub decode_errors: u64,
    pub transport_errors: u64,
}
