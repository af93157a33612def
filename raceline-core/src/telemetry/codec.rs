//! Fixed-point telemetry codec.
//!
//! The ledger stores telemetry in integer fields. Positions and acceleration
//! are scaled by 1000 (three decimal digits survive, the rest is dropped),
//! speed and lap values are stored as whole units. Acceleration is the only
//! signed quantity, and its ledger field is unsigned, so it is shifted by
//! [`ACCELERATION_OFFSET`] before storage.
//!
//! Every function here is pure and operates on `Copy` values, so the codec
//! can be used from any task without synchronization.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Position axes are clamped to `[-POSITION_LIMIT, POSITION_LIMIT]`.
pub const POSITION_LIMIT: f64 = 1_000_000.0;
/// Fixed-point scale for positions.
pub const POSITION_SCALE: f64 = 1000.0;
/// Speed is clamped to `[0, SPEED_MAX]`.
pub const SPEED_MAX: f64 = 500.0;
/// Lap index is clamped to `[0, LAP_MAX]`.
pub const LAP_MAX: f64 = 100.0;
/// Lap progress (percent) is clamped to `[0, LAP_PROGRESS_MAX]`.
pub const LAP_PROGRESS_MAX: f64 = 100.0;
/// Acceleration is clamped to `[-ACCELERATION_LIMIT, ACCELERATION_LIMIT]`.
pub const ACCELERATION_LIMIT: f64 = 10.0;
/// Fixed-point scale for acceleration.
pub const ACCELERATION_SCALE: f64 = 1000.0;
/// Shift applied to the scaled acceleration to make it non-negative.
pub const ACCELERATION_OFFSET: i64 = 100_000;
/// Upper bound of the ledger's acceleration field. The lower bound is 0.
///
/// With the clamp above the stored value is always within
/// `[90_000, 110_000]`, so the range check in [`encode`] never fails.
pub const ACCELERATION_FIELD_MAX: i64 = 200_000;

/// Telemetry of one vehicle in domain units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryFrame {
    pub position_x: f64,
    pub position_y: f64,
    pub speed: f64,
    pub current_lap: f64,
    pub lap_progress: f64,
    pub acceleration: f64,
}

/// Telemetry in the ledger's integer representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedTelemetry {
    pub position_x: i64,
    pub position_y: i64,
    pub speed: u32,
    pub current_lap: u32,
    pub lap_progress: u32,
    /// Scaled acceleration plus [`ACCELERATION_OFFSET`].
    pub acceleration: u32,
}

/// Errors returned by [`encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("{field} encodes to {value}, outside the ledger range [{min}, {max}]")]
    OutOfBounds {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Encode a frame for ledger storage.
pub fn encode(frame: TelemetryFrame) -> Result<EncodedTelemetry, EncodeError> {
    let position_x = scale(
        clamp(frame.position_x, -POSITION_LIMIT, POSITION_LIMIT),
        POSITION_SCALE,
    );
    let position_y = scale(
        clamp(frame.position_y, -POSITION_LIMIT, POSITION_LIMIT),
        POSITION_SCALE,
    );
    let acceleration = offset_acceleration(scale(
        clamp(frame.acceleration, -ACCELERATION_LIMIT, ACCELERATION_LIMIT),
        ACCELERATION_SCALE,
    ))?;

    Ok(EncodedTelemetry {
        position_x,
        position_y,
        speed: whole(clamp(frame.speed, 0.0, SPEED_MAX)),
        current_lap: whole(clamp(frame.current_lap, 0.0, LAP_MAX)),
        lap_progress: whole(clamp(frame.lap_progress, 0.0, LAP_PROGRESS_MAX)),
        acceleration,
    })
}

/// Decode a ledger record back into domain units.
pub fn decode(encoded: EncodedTelemetry) -> TelemetryFrame {
    TelemetryFrame {
        position_x: encoded.position_x as f64 / POSITION_SCALE,
        position_y: encoded.position_y as f64 / POSITION_SCALE,
        speed: f64::from(encoded.speed),
        current_lap: f64::from(encoded.current_lap),
        lap_progress: f64::from(encoded.lap_progress),
        acceleration: (i64::from(encoded.acceleration) - ACCELERATION_OFFSET) as f64
            / ACCELERATION_SCALE,
    }
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    let value = if value.is_finite() { value } else { 0.0 };
    value.clamp(min, max)
}

// Callers clamp first, so the rounded value always fits.
fn scale(value: f64, factor: f64) -> i64 {
    (value * factor).round() as i64
}

fn whole(value: f64) -> u32 {
    value.round() as u32
}

fn offset_acceleration(scaled: i64) -> Result<u32, EncodeError> {
    let stored = scaled + ACCELERATION_OFFSET;
    if !(0..=ACCELERATION_FIELD_MAX).contains(&stored) {
        return Err(EncodeError::OutOfBounds {
            field: "acceleration",
            value: stored,
            min: 0,
            max: ACCELERATION_FIELD_MAX,
        });
    }
    u32::try_from(stored).map_err(|_| EncodeError::OutOfBounds {
        field: "acceleration",
        value: stored,
        min: 0,
        max: ACCELERATION_FIELD_MAX,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_acceleration(acceleration: f64) -> TelemetryFrame {
        TelemetryFrame {
            acceleration,
            ..TelemetryFrame::default()
        }
    }

    #[test]
    fn test_acceleration_round_trip_within_a_thousandth() {
        let mut a = -10.0;
        while a <= 10.0 {
            let decoded = decode(encode(with_acceleration(a)).unwrap());
            assert!(
                (decoded.acceleration - a).abs() <= 0.001,
                "acceleration {a} decoded as {}",
                decoded.acceleration
            );
            a += 0.0137;
        }
    }

    #[test]
    fn test_acceleration_is_clamped_not_rejected() {
        let encoded = encode(with_acceleration(15.0)).unwrap();
        assert_eq!(encoded.acceleration, 110_000);
        assert_eq!(decode(encoded).acceleration, 10.0);

        let encoded = encode(with_acceleration(-250.0)).unwrap();
        assert_eq!(encoded.acceleration, 90_000);
        assert_eq!(decode(encoded).acceleration, -10.0);
    }

    #[test]
    fn test_zero_acceleration_sits_at_offset() {
        assert_eq!(encode(with_acceleration(0.0)).unwrap().acceleration, 100_000);
    }

    #[test]
    fn test_out_of_range_acceleration_field_is_rejected() {
        assert_eq!(
            offset_acceleration(150_000),
            Err(EncodeError::OutOfBounds {
                field: "acceleration",
                value: 250_000,
                min: 0,
                max: ACCELERATION_FIELD_MAX,
            })
        );
        assert!(offset_acceleration(-100_001).is_err());
        assert_eq!(offset_acceleration(-100_000), Ok(0));
        assert_eq!(offset_acceleration(100_000), Ok(200_000));
    }

    #[test]
    fn test_non_finite_inputs_become_zero() {
        let frame = TelemetryFrame {
            position_x: f64::NAN,
            position_y: f64::INFINITY,
            speed: f64::NEG_INFINITY,
            current_lap: f64::NAN,
            lap_progress: f64::INFINITY,
            acceleration: f64::NAN,
        };
        let encoded = encode(frame).unwrap();
        assert_eq!(
            encoded,
            EncodedTelemetry {
                position_x: 0,
                position_y: 0,
                speed: 0,
                current_lap: 0,
                lap_progress: 0,
                acceleration: 100_000,
            }
        );
    }

    #[test]
    fn test_positions_scale_and_clamp() {
        let frame = TelemetryFrame {
            position_x: 1.23456,
            position_y: -2_500_000.0,
            ..TelemetryFrame::default()
        };
        let encoded = encode(frame).unwrap();
        assert_eq!(encoded.position_x, 1235);
        assert_eq!(encoded.position_y, -1_000_000_000);

        let decoded = decode(encoded);
        assert_eq!(decoded.position_x, 1.235);
        assert_eq!(decoded.position_y, -1_000_000.0);
    }

    #[test]
    fn test_speed_and_laps_round_and_clamp() {
        let frame = TelemetryFrame {
            speed: 499.6,
            current_lap: 150.0,
            lap_progress: 42.4,
            ..TelemetryFrame::default()
        };
        let encoded = encode(frame).unwrap();
        assert_eq!(encoded.speed, 500);
        assert_eq!(encoded.current_lap, 100);
        assert_eq!(encoded.lap_progress, 42);

        let frame = TelemetryFrame {
            speed: -3.0,
            current_lap: -1.0,
            lap_progress: 120.0,
            ..TelemetryFrame::default()
        };
        let encoded = encode(frame).unwrap();
        assert_eq!(encoded.speed, 0);
        assert_eq!(encoded.current_lap, 0);
        assert_eq!(encoded.lap_progress, 100);
    }
}
