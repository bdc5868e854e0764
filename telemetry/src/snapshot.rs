use crate::parser::ParseError;
use serde::{Deserialize, Serialize};

/// Lowest cell temperature a pack sensor can plausibly report, in °C.
pub(crate) const CELL_TEMP_MIN: f64 = -40.0;
/// Highest cell temperature a pack sensor can plausibly report, in °C.
pub(crate) const CELL_TEMP_MAX: f64 = 150.0;

/// One complete, internally consistent set of sensor readings.
///
/// A snapshot is only ever built from a record that parsed and validated as
/// a whole; there is no partially filled variant. Once built it is immutable
/// and gets superseded, never mutated, by the next valid record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Vehicle speed in km/h.
    pub speed: f64,
    /// Motor speed in revolutions per minute.
    pub rpm: f64,
    /// Drive power in kW.
    pub power: f64,
    /// Pack current in A.
    pub current: f64,
    /// Battery state of charge, percent of capacity remaining.
    pub soc: f64,
    /// Hottest cell temperature in °C.
    pub cell_temp: f64,
    /// Short status text from the controller, `"OK"` when healthy.
    pub error: String,
}

impl TelemetrySnapshot {
    /// Builds a snapshot from already-parsed fields, validating ranges.
    ///
    /// Out-of-range values are rejected rather than clamped: a SOC of 140%
    /// means the sensor or the link is broken, and clamping it to 100 would
    /// hide exactly the fault the error display is there to surface.
    pub fn from_fields(
        speed: f64,
        rpm: f64,
        power: f64,
        current: f64,
        soc: f64,
        cell_temp: f64,
        error: String,
    ) -> Result<Self, ParseError> {
        for (name, value) in [
            ("speed", speed),
            ("rpm", rpm),
            ("power", power),
            ("current", current),
            ("soc", soc),
            ("cell_temp", cell_temp),
        ] {
            if !value.is_finite() {
                return Err(ParseError::OutOfRange { field: name, value });
            }
        }
        if speed < 0.0 {
            return Err(ParseError::OutOfRange {
                field: "speed",
                value: speed,
            });
        }
        if rpm < 0.0 {
            return Err(ParseError::OutOfRange {
                field: "rpm",
                value: rpm,
            });
        }
        if !(0.0..=100.0).contains(&soc) {
            return Err(ParseError::OutOfRange {
                field: "soc",
                value: soc,
            });
        }
        if !(CELL_TEMP_MIN..=CELL_TEMP_MAX).contains(&cell_temp) {
            return Err(ParseError::OutOfRange {
                field: "cell_temp",
                value: cell_temp,
            });
        }

        Ok(Self {
            speed,
            rpm,
            power,
            current,
            soc,
            cell_temp,
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> (f64, f64, f64, f64, f64, f64, String) {
        (45.0, 6200.0, 120.5, 30.2, 78.0, 33.0, "OK".to_string())
    }

    #[test]
    fn valid_fields_build_a_snapshot() {
        let (speed, rpm, power, current, soc, cell_temp, error) = fields();
        let snapshot =
            TelemetrySnapshot::from_fields(speed, rpm, power, current, soc, cell_temp, error)
                .unwrap();

        assert_eq!(snapshot.speed, 45.0);
        assert_eq!(snapshot.soc, 78.0);
        assert_eq!(snapshot.error, "OK");
    }

    #[test]
    fn soc_outside_percent_range_is_rejected() {
        for soc in [-0.1, 100.5, 140.0] {
            let err =
                TelemetrySnapshot::from_fields(45.0, 6200.0, 120.5, 30.2, soc, 33.0, "OK".into())
                    .unwrap_err();
            assert_eq!(err, ParseError::OutOfRange { field: "soc", value: soc });
        }
    }

    #[test]
    fn implausible_cell_temperature_is_rejected() {
        let err =
            TelemetrySnapshot::from_fields(45.0, 6200.0, 120.5, 30.2, 78.0, 500.0, "OK".into())
                .unwrap_err();
        assert_eq!(
            err,
            ParseError::OutOfRange {
                field: "cell_temp",
                value: 500.0
            }
        );
    }

    #[test]
    fn negative_speed_and_rpm_are_rejected() {
        assert!(
            TelemetrySnapshot::from_fields(-1.0, 6200.0, 0.0, 0.0, 78.0, 33.0, "OK".into())
                .is_err()
        );
        assert!(
            TelemetrySnapshot::from_fields(45.0, -1.0, 0.0, 0.0, 78.0, 33.0, "OK".into()).is_err()
        );
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(
            TelemetrySnapshot::from_fields(f64::NAN, 0.0, 0.0, 0.0, 50.0, 25.0, "OK".into())
                .is_err()
        );
        assert!(
            TelemetrySnapshot::from_fields(0.0, 0.0, f64::INFINITY, 0.0, 50.0, 25.0, "OK".into())
                .is_err()
        );
    }
}
