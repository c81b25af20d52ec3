//! Pure conversions from raw platform events to canonical samples.

use glasspane_types::{
    remap_button, timestamp_us, ClientRect, InputArea, KeyEventType, KeySample, PointerEventType,
    PointerSample, WheelSample,
};

use crate::raw::{RawKeyEvent, RawPointerEvent, RawWheelEvent};

/// Build a pointer sample relative to `rect`.
///
/// `area` is the custom input area for the event's pointer type, if
/// remapping is enabled for it.
pub fn pointer_sample(
    raw: &RawPointerEvent,
    event_type: PointerEventType,
    rect: &ClientRect,
    min_pressure: f64,
    area: Option<InputArea>,
) -> PointerSample {
    let (mut x, mut y) = rect.normalize(raw.client_x, raw.client_y);
    if let Some(area) = area {
        (x, y) = area.apply(x, y);
    }
    let diagonal = rect.diagonal();

    PointerSample {
        event_type,
        pointer_id: raw.pointer_id,
        timestamp: timestamp_us(raw.time_stamp),
        is_primary: raw.is_primary,
        pointer_type: raw.pointer_type,
        button: remap_button(raw.button),
        buttons: raw.buttons,
        x,
        y,
        movement_x: raw.movement_x.unwrap_or(0.0),
        movement_y: raw.movement_y.unwrap_or(0.0),
        // Some devices always report 0.
        pressure: raw.pressure.max(min_pressure),
        tilt_x: raw.tilt_x,
        tilt_y: raw.tilt_y,
        twist: raw.twist,
        width: raw.width / diagonal,
        height: raw.height / diagonal,
    }
}

/// Build a wheel sample, scaling deltas to pixel equivalents.
pub fn wheel_sample(raw: &RawWheelEvent) -> WheelSample {
    let scale = raw.delta_mode.scale();
    WheelSample {
        dx: round_half_up(raw.delta_x * scale),
        dy: round_half_up(raw.delta_y * scale),
        timestamp: timestamp_us(raw.time_stamp),
    }
}

/// Round to the nearest integer, halves toward positive infinity.
fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

/// Build a key sample.
pub fn key_sample(raw: &RawKeyEvent, event_type: KeyEventType) -> KeySample {
    KeySample {
        event_type,
        code: raw.code.clone(),
        key: raw.key.clone(),
        location: raw.location,
        alt: raw.alt_key,
        ctrl: raw.ctrl_key,
        shift: raw.shift_key,
        meta: raw.meta_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glasspane_types::{DeltaMode, PointerType};

    fn raw_pointer(client_x: f64, client_y: f64) -> RawPointerEvent {
        RawPointerEvent {
            pointer_id: 3,
            time_stamp: 1.5,
            is_primary: true,
            pointer_type: PointerType::Pen,
            button: 0,
            buttons: 1,
            client_x,
            client_y,
            movement_x: None,
            movement_y: Some(2.0),
            pressure: 0.3,
            tilt_x: 10.0,
            tilt_y: -5.0,
            twist: 90.0,
            width: 30.0,
            height: 40.0,
            coalesced: None,
        }
    }

    #[test]
    fn pointer_sample_fields() {
        let rect = ClientRect::new(10.0, 20.0, 300.0, 400.0);
        let sample = pointer_sample(
            &raw_pointer(160.0, 220.0),
            PointerEventType::PointerDown,
            &rect,
            0.0,
            None,
        );
        assert_eq!(sample.timestamp, 1_500);
        assert_eq!(sample.button, 1);
        assert_eq!(sample.buttons, 1);
        assert!((sample.x - 0.5).abs() < 1e-12);
        assert!((sample.y - 0.5).abs() < 1e-12);
        assert_eq!(sample.movement_x, 0.0);
        assert_eq!(sample.movement_y, 2.0);
        assert!((sample.width - 30.0 / 500.0).abs() < 1e-12);
        assert!((sample.height - 40.0 / 500.0).abs() < 1e-12);
        assert_eq!(sample.tilt_x, 10.0);
        assert_eq!(sample.twist, 90.0);
    }

    #[test]
    fn pointer_sample_is_scale_independent() {
        let small = ClientRect::new(0.0, 0.0, 320.0, 240.0);
        let large = ClientRect::new(0.0, 0.0, 640.0, 480.0);

        let mut raw_small = raw_pointer(80.0, 60.0);
        raw_small.width = 16.0;
        raw_small.height = 12.0;
        let mut raw_large = raw_pointer(160.0, 120.0);
        raw_large.width = 32.0;
        raw_large.height = 24.0;

        let a = pointer_sample(&raw_small, PointerEventType::PointerMove, &small, 0.0, None);
        let b = pointer_sample(&raw_large, PointerEventType::PointerMove, &large, 0.0, None);
        for (u, v) in [(a.x, b.x), (a.y, b.y), (a.width, b.width), (a.height, b.height)] {
            assert!((u - v).abs() < 1e-12, "{u} != {v}");
        }
    }

    #[test]
    fn pressure_is_floor_clamped() {
        let rect = ClientRect::new(0.0, 0.0, 100.0, 100.0);
        for raw_pressure in [0.0, 0.1, 0.25, 0.5, 1.0] {
            let mut raw = raw_pointer(0.0, 0.0);
            raw.pressure = raw_pressure;
            let sample = pointer_sample(&raw, PointerEventType::PointerMove, &rect, 0.25, None);
            assert!(sample.pressure >= 0.25);
            assert_eq!(sample.pressure, raw_pressure.max(0.25));
        }
    }

    #[test]
    fn custom_area_remaps_after_normalisation() {
        let rect = ClientRect::new(0.0, 0.0, 200.0, 100.0);
        let area = InputArea {
            x: 0.5,
            y: 0.5,
            w: 0.5,
            h: 0.5,
        };
        let sample = pointer_sample(
            &raw_pointer(100.0, 50.0),
            PointerEventType::PointerMove,
            &rect,
            0.0,
            Some(area),
        );
        assert!((sample.x - 0.75).abs() < 1e-12);
        assert!((sample.y - 0.75).abs() < 1e-12);
    }

    #[test]
    fn wheel_delta_scaling() {
        let line = wheel_sample(&RawWheelEvent {
            delta_x: 3.0,
            delta_y: 0.0,
            delta_mode: DeltaMode::Line,
            time_stamp: 0.0,
        });
        assert_eq!(line.dx, 30);

        let page = wheel_sample(&RawWheelEvent {
            delta_x: 2.0,
            delta_y: 0.0,
            delta_mode: DeltaMode::Page,
            time_stamp: 0.0,
        });
        assert_eq!(page.dx, 2000);

        let pixel = wheel_sample(&RawWheelEvent {
            delta_x: 7.0,
            delta_y: -2.6,
            delta_mode: DeltaMode::Pixel,
            time_stamp: 2.0,
        });
        assert_eq!(pixel.dx, 7);
        assert_eq!(pixel.dy, -3);
        assert_eq!(pixel.timestamp, 2_000);
    }

    #[test]
    fn wheel_halves_round_toward_positive() {
        let half = wheel_sample(&RawWheelEvent {
            delta_x: 2.5,
            delta_y: -2.5,
            delta_mode: DeltaMode::Pixel,
            time_stamp: 0.0,
        });
        assert_eq!(half.dx, 3);
        assert_eq!(half.dy, -2);

        let line = wheel_sample(&RawWheelEvent {
            delta_x: -0.25,
            delta_y: 0.25,
            delta_mode: DeltaMode::Line,
            time_stamp: 0.0,
        });
        assert_eq!(line.dx, -2);
        assert_eq!(line.dy, 3);
    }

    #[test]
    fn key_sample_copies_modifiers() {
        let raw = RawKeyEvent {
            code: "KeyS".to_string(),
            key: "S".to_string(),
            location: 0,
            repeat: false,
            alt_key: false,
            ctrl_key: true,
            shift_key: true,
            meta_key: false,
        };
        let sample = key_sample(&raw, KeyEventType::Up);
        assert_eq!(sample.event_type, KeyEventType::Up);
        assert_eq!(sample.code, "KeyS");
        assert!(sample.ctrl && sample.shift && !sample.alt && !sample.meta);
    }
}
