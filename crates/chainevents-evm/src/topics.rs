//! Topic filter builder.
//!
//! Walks an event's arguments in declaration order and produces one topic
//! slot per indexed argument, preceded by the signature slot:
//!
//! ```text
//! Transfer(address indexed from, address indexed to, uint256 value)
//!   slot 0: {keccak("Transfer(address,address,uint256)")}
//!   slot 1: from: candidates, or wildcard
//!   slot 2: to:   candidates, or wildcard
//!   (value is not indexed and has no slot)
//! ```

use chainevents_core::{error::FilterError, filter::Topic, schema::EventSchema};
use indexmap::IndexMap;
use tracing::debug;

use crate::coerce;

/// Build the topic slots for `schema` under the given value constraints.
///
/// Constraints naming a non-indexed (or unknown) argument are ignored:
/// non-indexed values live in the data payload and cannot be matched by a
/// node-side filter. Any coercion failure aborts the whole build.
pub fn build_topics(
    schema: &EventSchema,
    constraints: Option<&IndexMap<String, Vec<String>>>,
) -> Result<Vec<Topic>, FilterError> {
    let mut topics = Vec::with_capacity(schema.topic_count());
    topics.push(Topic::from(schema.signature_hash));

    for arg in schema.indexed() {
        let candidates = match constraints.and_then(|c| c.get(&arg.name)) {
            Some(values) => values
                .iter()
                .map(|raw| coerce::coerce_topic(arg, raw))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        topics.push(Topic::from_candidates(dedup(candidates)));
    }

    if let Some(constraints) = constraints {
        for name in constraints.keys() {
            match schema.argument(name) {
                Some(arg) if arg.indexed => {}
                Some(_) => debug!(
                    event = %schema.name,
                    argument = %name,
                    "ignoring constraint on non-indexed argument"
                ),
                None => debug!(
                    event = %schema.name,
                    argument = %name,
                    "ignoring constraint on unknown argument"
                ),
            }
        }
    }

    debug!(event = %schema.name, slots = topics.len(), "built topic filter");
    Ok(topics)
}

/// Drop repeated candidates, keeping first-seen order.
fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
