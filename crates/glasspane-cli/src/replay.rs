//! Offline replay of recorded input through the canonicalizer.

use glasspane_client::Config;
use glasspane_input::{EventCanonicalizer, RecordedEvent, StaticSurface};
use glasspane_protocol::ChannelSink;
use glasspane_types::{ClientRect, SharedSettings};

/// Canonicalize `events` against `rect` and return the wire messages they
/// produce, in order.
pub fn replay(
    config: &Config,
    rect: ClientRect,
    events: &[RecordedEvent],
) -> anyhow::Result<Vec<String>> {
    let (sink, mut frames) = ChannelSink::new();
    let mut canonicalizer = EventCanonicalizer::new(
        Box::new(StaticSurface::new(rect)),
        Box::new(sink),
        Box::new(SharedSettings::new(config.settings())),
    );
    for event in events {
        canonicalizer.dispatch(event)?;
    }

    let mut out = Vec::new();
    while let Ok(frame) = frames.try_recv() {
        out.push(frame);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_produces_one_frame_per_message() {
        let events: Vec<RecordedEvent> = [
            r#"{"kind":"pointer","event_type":"pointerdown","pointer_id":1,"time_stamp":1.0,"pointer_type":"mouse","button":0,"buttons":1,"client_x":50,"client_y":25}"#,
            r#"{"kind":"wheel","delta_x":0,"delta_y":3,"delta_mode":"line","time_stamp":2.0}"#,
            r#"{"kind":"key_down","code":"KeyA","key":"a"}"#,
        ]
        .iter()
        .map(|line| RecordedEvent::from_json_line(line).unwrap())
        .collect();

        let frames = replay(
            &Config::default(),
            ClientRect::new(0.0, 0.0, 100.0, 100.0),
            &events,
        )
        .unwrap();
        assert_eq!(frames.len(), 3);

        let lines: Vec<serde_json::Value> = frames
            .iter()
            .map(|f| serde_json::from_str(f).unwrap())
            .collect();
        assert_eq!(lines[0]["PointerEvent"]["x"], 0.5);
        assert_eq!(lines[0]["PointerEvent"]["y"], 0.25);
        assert_eq!(lines[1]["WheelEvent"]["dy"], 30);
        assert_eq!(lines[2]["KeyboardEvent"]["code"], "KeyA");
    }
}
