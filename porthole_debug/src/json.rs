// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON trace export.
//!
//! [`export`] writes events recorded by a
//! [`RecorderSink`](crate::recorder::RecorderSink) as a JSON array, one
//! object per event with a `"type"` discriminant, for offline analysis of a
//! session's behavior.

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::RecordedEvent;

fn event_value(event: &RecordedEvent) -> Value {
    match event {
        RecordedEvent::SessionCreated(e) => json!({
            "type": "session_created",
            "supported": e.supported,
        }),
        RecordedEvent::RenderBegan(e) => json!({
            "type": "render_began",
            "generation": e.generation,
        }),
        RecordedEvent::FontsResolved(e) => json!({
            "type": "fonts_resolved",
            "count": e.count,
            "cache_hits": e.cache_hits,
        }),
        RecordedEvent::RenderCommitted(e) => json!({
            "type": "render_committed",
            "generation": e.generation,
            "width": e.width,
            "height": e.height,
        }),
        RecordedEvent::RenderSuperseded(e) => json!({
            "type": "render_superseded",
            "generation": e.generation,
        }),
        RecordedEvent::RenderFailed(e) => json!({
            "type": "render_failed",
            "generation": e.generation,
            "stage": e.stage,
        }),
        RecordedEvent::PipEntered => json!({ "type": "pip_entered" }),
        RecordedEvent::PipLeft => json!({ "type": "pip_left" }),
        RecordedEvent::AudioSwapped(e) => json!({
            "type": "audio_swapped",
            "attached_tracks": e.attached_tracks,
        }),
        RecordedEvent::SessionClosed => json!({ "type": "session_closed" }),
    }
}

/// Writes recorded events as a JSON array to the given writer.
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    let values: Vec<Value> = events.iter().map(event_value).collect();
    serde_json::to_writer(&mut *writer, &Value::Array(values))?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use porthole_core::trace::{RenderCommitted, SessionCreated};

    use super::*;

    #[test]
    fn exports_a_json_array_with_type_discriminants() {
        let events = [
            RecordedEvent::SessionCreated(SessionCreated { supported: false }),
            RecordedEvent::RenderCommitted(RenderCommitted {
                generation: 2,
                width: 320,
                height: 240,
            }),
            RecordedEvent::SessionClosed,
        ];
        let mut out = Vec::new();
        export(&events, &mut out).unwrap();

        let parsed: Value = serde_json::from_slice(&out).unwrap();
        let array = parsed.as_array().unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array[0]["type"], "session_created");
        assert_eq!(array[0]["supported"], false);
        assert_eq!(array[1]["generation"], 2);
        assert_eq!(array[2]["type"], "session_closed");
    }
}
