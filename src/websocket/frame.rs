//! Push frame decoding.
//!
//! The service pushes JSON arrays of trade records. When it fans out through
//! Socket.IO the same array arrives wrapped in an event packet
//! (`42["data",[...]]`), and the transport interleaves its own control
//! packets, which carry no records.

use crate::models::TradeRecord;
use crate::{HandicapError, Result};

/// Name of the Socket.IO event carrying record batches.
const DATA_EVENT: &str = "data";

/// Decodes one text frame.
///
/// Returns `Ok(None)` for frames that carry no records (transport control
/// packets and events other than `data`).
///
/// # Errors
///
/// Returns [`HandicapError::Json`] if a record payload does not parse, or
/// [`HandicapError::MalformedMessage`] for frames of an unknown shape.
pub fn decode_frame(text: &str) -> Result<Option<Vec<TradeRecord>>> {
    let text = text.trim();

    if text.starts_with('[') {
        return Ok(Some(serde_json::from_str(text)?));
    }

    // Engine.IO packet: one type digit, then for Socket.IO messages one
    // more type digit and an optional ack id, then an optional JSON payload.
    let payload_start = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (kind, payload) = text.split_at(payload_start);

    match kind {
        // open, close, ping, pong, upgrade, noop, connect/disconnect acknowledgements
        "0" | "1" | "2" | "3" | "5" | "6" | "40" | "41" => Ok(None),
        event if event.starts_with("42") => decode_event(payload),
        _ => Err(HandicapError::MalformedMessage(format!(
            "unrecognized frame: {}",
            text.chars().take(64).collect::<String>()
        ))),
    }
}

fn decode_event(payload: &str) -> Result<Option<Vec<TradeRecord>>> {
    let mut event: Vec<serde_json::Value> = serde_json::from_str(payload)?;
    if event.first().and_then(|name| name.as_str()) != Some(DATA_EVENT) {
        return Ok(None);
    }
    if event.len() < 2 {
        return Err(HandicapError::MalformedMessage(
            "data event without payload".to_string(),
        ));
    }
    let records = serde_json::from_value(event.swap_remove(1))?;
    Ok(Some(records))
}
