//! Text and JSON rendering.

use anyhow::Result;
use chainevents_core::{event::DecodedEvent, schema::EventSchema};

pub fn print_schema(schema: &EventSchema) {
    println!("{}", schema.signature());
    println!("  topic0:  {}", schema.signature_hash);
    println!("  topics:  {}", schema.topic_count());
    for arg in &schema.arguments {
        let kind = if arg.indexed { "indexed" } else { "data" };
        println!("  {:<8} {:<20} {}", kind, arg.ty, arg.name);
    }
}

pub fn print_event(event: &DecodedEvent, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    println!(
        "{} #{}:{} {} tx {}",
        event.event, event.block_number, event.log_index, event.address, event.transaction_hash
    );
    for (name, value) in &event.fields {
        println!("  {name}: {value}");
    }
    Ok(())
}
