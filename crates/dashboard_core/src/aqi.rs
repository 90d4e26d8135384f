//! crates/dashboard_core/src/aqi.rs
//!
//! EPA Air Quality Index calculation for particulate matter.
//!
//! Concentrations are truncated to one decimal place and mapped onto a
//! breakpoint table with linear interpolation:
//!
//! ```text
//! AQI = (aqi_high - aqi_low) / (conc_high - conc_low) * (C - conc_low) + aqi_low
//! ```

use crate::domain::{
    AirQualityReading, AqiCategory, OverallAqi, Pollutant, PollutantReading, SensorReading,
};

/// The highest index the scale reports.
pub const MAX_AQI: u16 = 500;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AqiError {
    #[error("No PM2.5 or PM10 data found in sensor readings")]
    NoReadings,
}

/// One concentration band of a breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub conc_low: f64,
    pub conc_high: f64,
    pub aqi_low: u16,
    pub aqi_high: u16,
}

const fn bp(conc_low: f64, conc_high: f64, aqi_low: u16, aqi_high: u16) -> Breakpoint {
    Breakpoint {
        conc_low,
        conc_high,
        aqi_low,
        aqi_high,
    }
}

/// EPA breakpoints for PM2.5 (µg/m³, 24-hour).
pub const PM25_BREAKPOINTS: [Breakpoint; 6] = [
    bp(0.0, 9.0, 0, 50),
    bp(9.1, 35.4, 51, 100),
    bp(35.5, 55.4, 101, 150),
    bp(55.5, 125.4, 151, 200),
    bp(125.5, 225.4, 201, 300),
    bp(225.5, 325.4, 301, 500),
];

/// EPA breakpoints for PM10 (µg/m³, 24-hour).
pub const PM10_BREAKPOINTS: [Breakpoint; 6] = [
    bp(0.0, 54.0, 0, 50),
    bp(55.0, 154.0, 51, 100),
    bp(155.0, 254.0, 101, 150),
    bp(255.0, 354.0, 151, 200),
    bp(355.0, 424.0, 201, 300),
    bp(425.0, 604.0, 301, 500),
];

impl AqiCategory {
    pub fn from_aqi(aqi: u16) -> Self {
        match aqi {
            0..=50 => AqiCategory::Good,
            51..=100 => AqiCategory::Moderate,
            101..=150 => AqiCategory::UnhealthyForSensitive,
            151..=200 => AqiCategory::Unhealthy,
            201..=300 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            AqiCategory::Good => 1,
            AqiCategory::Moderate => 2,
            AqiCategory::UnhealthyForSensitive => 3,
            AqiCategory::Unhealthy => 4,
            AqiCategory::VeryUnhealthy => 5,
            AqiCategory::Hazardous => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitive => "Unhealthy for Sensitive",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    /// Widget colour for the category.
    pub fn color(self) -> &'static str {
        match self {
            AqiCategory::Good => "#00a434",
            AqiCategory::Moderate => "#f3a81f",
            AqiCategory::UnhealthyForSensitive => "#f08216",
            AqiCategory::Unhealthy => "#fc3535",
            AqiCategory::VeryUnhealthy => "#cf15b8",
            AqiCategory::Hazardous => "#851ee3",
        }
    }
}

/// Truncates (never rounds) a concentration to one decimal place.
fn truncate_concentration(value: f64) -> f64 {
    (value * 10.0).floor() / 10.0
}

/// Maps a concentration onto the index scale using the given table.
///
/// Values above the top band report [`MAX_AQI`], values below the lowest
/// floor report 0. A value that lands between two bands takes the floor of
/// the band above it.
pub fn calculate_aqi(concentration: f64, breakpoints: &[Breakpoint]) -> u16 {
    let truncated = truncate_concentration(concentration);

    let Some(last) = breakpoints.last() else {
        return 0;
    };
    if truncated > last.conc_high {
        return MAX_AQI;
    }

    let band = breakpoints
        .iter()
        .find(|b| truncated >= b.conc_low && truncated <= b.conc_high);

    let Some(band) = band else {
        return breakpoints
            .iter()
            .find(|b| b.conc_low > truncated && breakpoints[0].conc_low <= truncated)
            .map(|b| b.aqi_low)
            .unwrap_or(0);
    };

    let aqi_span = f64::from(band.aqi_high - band.aqi_low);
    let conc_span = band.conc_high - band.conc_low;
    let aqi = aqi_span / conc_span * (truncated - band.conc_low) + f64::from(band.aqi_low);

    aqi.round().clamp(0.0, f64::from(MAX_AQI)) as u16
}

fn pollutant_reading(concentration: f64, breakpoints: &[Breakpoint]) -> PollutantReading {
    let aqi = calculate_aqi(concentration, breakpoints);
    PollutantReading {
        concentration,
        aqi,
        category: AqiCategory::from_aqi(aqi),
    }
}

/// Combines the per-pollutant readings into the overall index.
///
/// The overall value is the maximum of the available pollutants; on a tie
/// PM2.5 is reported as primary.
pub fn calculate_overall(
    pm25: Option<&PollutantReading>,
    pm10: Option<&PollutantReading>,
) -> Result<OverallAqi, AqiError> {
    let (aqi, primary) = match (pm25, pm10) {
        (None, None) => return Err(AqiError::NoReadings),
        (Some(a), None) => (a.aqi, Pollutant::Pm25),
        (None, Some(b)) => (b.aqi, Pollutant::Pm10),
        (Some(a), Some(b)) if b.aqi > a.aqi => (b.aqi, Pollutant::Pm10),
        (Some(a), Some(_)) => (a.aqi, Pollutant::Pm25),
    };

    Ok(OverallAqi {
        aqi,
        category: AqiCategory::from_aqi(aqi),
        primary,
    })
}

/// Builds a full [`AirQualityReading`] from raw sensor concentrations.
/// Non-finite or negative concentrations are treated as absent.
pub fn calculate_from_sensor_data(sensor: &SensorReading) -> Result<AirQualityReading, AqiError> {
    let valid = |v: Option<f64>| v.filter(|c| c.is_finite() && *c >= 0.0);

    let pm25 = valid(sensor.pm25).map(|c| pollutant_reading(c, &PM25_BREAKPOINTS));
    let pm10 = valid(sensor.pm10).map(|c| pollutant_reading(c, &PM10_BREAKPOINTS));
    let overall = calculate_overall(pm25.as_ref(), pm10.as_ref())?;

    Ok(AirQualityReading {
        pm25,
        pm10,
        overall,
        timestamp: sensor.timestamp.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(pm25: Option<f64>, pm10: Option<f64>) -> SensorReading {
        SensorReading {
            pm25,
            pm10,
            timestamp: "2026-10-16 08:00:00".to_string(),
        }
    }

    #[test]
    fn test_band_edges_map_to_band_aqi() {
        for table in [&PM25_BREAKPOINTS[..], &PM10_BREAKPOINTS[..]] {
            for band in table {
                assert_eq!(calculate_aqi(band.conc_low, table), band.aqi_low);
                assert_eq!(calculate_aqi(band.conc_high, table), band.aqi_high);
            }
        }
    }

    #[test]
    fn test_truncates_instead_of_rounding() {
        // 9.09 truncates to 9.0 (Good, 50) rather than rounding up to 9.1 (51).
        assert_eq!(calculate_aqi(9.09, &PM25_BREAKPOINTS), 50);
        assert_eq!(calculate_aqi(9.1, &PM25_BREAKPOINTS), 51);
    }

    #[test]
    fn test_interpolation_inside_band() {
        // (49 / 26.3) * (12.3 - 9.1) + 51 = 56.96 -> 57
        assert_eq!(calculate_aqi(12.3, &PM25_BREAKPOINTS), 57);
        // (49 / 99) * (100 - 55) + 51 = 73.27 -> 73
        assert_eq!(calculate_aqi(100.0, &PM10_BREAKPOINTS), 73);
    }

    #[test]
    fn test_out_of_range_values() {
        assert_eq!(calculate_aqi(400.0, &PM25_BREAKPOINTS), MAX_AQI);
        assert_eq!(calculate_aqi(604.1, &PM10_BREAKPOINTS), MAX_AQI);
        assert_eq!(calculate_aqi(-3.0, &PM25_BREAKPOINTS), 0);
    }

    #[test]
    fn test_gap_between_bands_uses_upper_floor() {
        assert_eq!(calculate_aqi(54.5, &PM10_BREAKPOINTS), 51);
    }

    #[test]
    fn test_monotonic_within_band() {
        for table in [&PM25_BREAKPOINTS[..], &PM10_BREAKPOINTS[..]] {
            for band in table {
                let mut previous = 0;
                let steps = ((band.conc_high - band.conc_low) * 10.0).round() as usize;
                for step in 0..=steps {
                    let c = band.conc_low + step as f64 / 10.0;
                    let aqi = calculate_aqi(c, table);
                    assert!(aqi >= previous, "AQI decreased at {}", c);
                    previous = aqi;
                }
            }
        }
    }

    #[test]
    fn test_category_thresholds() {
        assert_eq!(AqiCategory::from_aqi(0).id(), 1);
        assert_eq!(AqiCategory::from_aqi(50).id(), 1);
        assert_eq!(AqiCategory::from_aqi(51).id(), 2);
        assert_eq!(AqiCategory::from_aqi(150).id(), 3);
        assert_eq!(AqiCategory::from_aqi(200).id(), 4);
        assert_eq!(AqiCategory::from_aqi(300).id(), 5);
        assert_eq!(AqiCategory::from_aqi(301).id(), 6);
        assert_eq!(AqiCategory::Hazardous.label(), "Hazardous");
    }

    #[test]
    fn test_overall_takes_max_pollutant() {
        let reading = calculate_from_sensor_data(&sensor(Some(5.0), Some(160.0))).unwrap();
        let pm25 = reading.pm25.as_ref().unwrap().aqi;
        let pm10 = reading.pm10.as_ref().unwrap().aqi;
        assert_eq!(reading.overall.aqi, pm25.max(pm10));
        assert_eq!(reading.overall.primary, Pollutant::Pm10);
        assert_eq!(reading.overall.category, AqiCategory::UnhealthyForSensitive);
    }

    #[test]
    fn test_overall_tie_prefers_pm25() {
        let a = PollutantReading {
            concentration: 9.0,
            aqi: 50,
            category: AqiCategory::Good,
        };
        let b = PollutantReading {
            concentration: 54.0,
            aqi: 50,
            category: AqiCategory::Good,
        };
        let overall = calculate_overall(Some(&a), Some(&b)).unwrap();
        assert_eq!(overall.primary, Pollutant::Pm25);
    }

    #[test]
    fn test_no_pollutants_is_an_error() {
        assert_eq!(calculate_overall(None, None), Err(AqiError::NoReadings));
        assert_eq!(
            calculate_from_sensor_data(&sensor(None, Some(f64::NAN))),
            Err(AqiError::NoReadings)
        );
    }

    #[test]
    fn test_pm25_only_reading() {
        let reading = calculate_from_sensor_data(&sensor(Some(12.3), None)).unwrap();
        let pm25 = reading.pm25.as_ref().unwrap();
        assert_eq!(pm25.aqi, calculate_aqi(12.3, &PM25_BREAKPOINTS));
        assert_eq!(reading.overall.primary, Pollutant::Pm25);
        assert!(reading.pm10.is_none());

        let json = serde_json::to_value(&reading).unwrap();
        assert!(json.get("pm10").is_none());
        assert_eq!(json["overall"]["primary"], "PM2.5");
    }

    #[test]
    fn test_zero_concentration_is_a_reading() {
        let reading = calculate_from_sensor_data(&sensor(Some(0.0), None)).unwrap();
        assert_eq!(reading.overall.aqi, 0);
        assert_eq!(reading.overall.category, AqiCategory::Good);
    }
}
