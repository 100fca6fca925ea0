//! TLE registry and SGP4 propagation.
//!
//! Loads a satellite catalog once at startup and answers
//! `(sat_id, instant) -> (position, velocity)` on demand. The catalog is
//! read-only after load, so [`SatelliteCatalog::propagate`] is safe to call
//! concurrently from multiple handover tasks without any locking.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use krios_geometry::CartesianKm;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum EphemerisError {
    #[error("malformed TLE file: {0}")]
    MalformedFile(String),
    #[error("unknown sat_id {0} (missing from satellite catalog)")]
    UnknownSatellite(i64),
    #[error("invalid TLE for sat_id {0}: {1}")]
    InvalidTle(i64, String),
    #[error("propagation failed for sat_id {0}: {1}")]
    PropagationFailed(i64, String),
}

pub type Result<T> = std::result::Result<T, EphemerisError>;

/// Two-line element set for one satellite, immutable after load.
#[derive(Debug, Clone)]
pub struct TleEntry {
    pub line1: String,
    pub line2: String,
}

/// A propagated position/velocity sample at one instant, in the
/// Earth-Centered Cartesian frame (km, km/s). Never cached beyond the
/// single decision that produced it.
#[derive(Debug, Clone, Copy)]
pub struct EphemerisSample {
    pub position: CartesianKm,
    pub velocity_kms: (f64, f64, f64),
}

/// Satellite catalog keyed by integer `sat_id`. Immutable after
/// [`load_tle_file`]; lives for the process lifetime.
#[derive(Debug, Default)]
pub struct SatelliteCatalog {
    entries: HashMap<i64, TleEntry>,
}

impl SatelliteCatalog {
    pub fn from_entries(entries: impl IntoIterator<Item = (i64, TleEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Propagate the named satellite's position and velocity to `instant`.
    ///
    /// An absent `sat_id` is fatal to the caller — it signals a
    /// misconfigured node label, not a transient condition.
    pub fn propagate(&self, sat_id: i64, instant: DateTime<Utc>) -> Result<EphemerisSample> {
        let tle = self
            .entries
            .get(&sat_id)
            .ok_or(EphemerisError::UnknownSatellite(sat_id))?;

        let elements = sgp4::Elements::from_tle(None, tle.line1.as_bytes(), tle.line2.as_bytes())
            .map_err(|e| EphemerisError::InvalidTle(sat_id, format!("{e:?}")))?;

        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| EphemerisError::PropagationFailed(sat_id, format!("{e:?}")))?;

        let epoch_utc = DateTime::<Utc>::from_naive_utc_and_offset(elements.datetime, Utc);
        let minutes_since_epoch =
            instant.signed_duration_since(epoch_utc).num_milliseconds() as f64 / 60_000.0;

        let prediction = constants.propagate(minutes_since_epoch).map_err(|e| {
            // The propagator's own error code is not fatal to the core; it is
            // surfaced through logs and reported up as a typed error so the
            // caller (zone filter) can decide to skip this node for this
            // decision rather than aborting the whole scheduling pass.
            warn!(sat_id, error = ?e, "sgp4 propagation returned an error code");
            EphemerisError::PropagationFailed(sat_id, format!("{e:?}"))
        })?;

        Ok(EphemerisSample {
            position: CartesianKm::new(
                prediction.position[0],
                prediction.position[1],
                prediction.position[2],
            ),
            velocity_kms: (
                prediction.velocity[0],
                prediction.velocity[1],
                prediction.velocity[2],
            ),
        })
    }
}

/// Parse a `tles.txt`-style file: groups of three lines (an optional name
/// line followed by the two standard TLE lines) with the `sat_id` read from
/// the NORAD catalog number embedded in columns 3-7 of line 1. Blank lines
/// between groups are ignored.
pub fn load_tle_file(path: impl AsRef<Path>) -> Result<SatelliteCatalog> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| EphemerisError::MalformedFile(format!("{}: {e}", path.display())))?;

    parse_tle_text(&text)
}

fn parse_tle_text(text: &str) -> Result<SatelliteCatalog> {
    let mut entries = HashMap::new();
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();

    while let Some(line) = lines.next() {
        let line1 = if line.starts_with("1 ") {
            line.to_string()
        } else {
            // Name line — the next line must be the actual TLE line 1.
            match lines.next() {
                Some(l1) if l1.starts_with("1 ") => l1.to_string(),
                Some(other) => {
                    return Err(EphemerisError::MalformedFile(format!(
                        "expected TLE line 1 after name line, got: {other}"
                    )))
                }
                None => {
                    return Err(EphemerisError::MalformedFile(
                        "file ended after a name line with no TLE body".into(),
                    ))
                }
            }
        };

        let line2 = lines.next().ok_or_else(|| {
            EphemerisError::MalformedFile("TLE line 1 with no matching line 2".into())
        })?;

        if !line2.starts_with("2 ") {
            return Err(EphemerisError::MalformedFile(format!(
                "expected TLE line 2, got: {line2}"
            )));
        }

        let sat_id = parse_norad_id(&line1)?;
        entries.insert(
            sat_id,
            TleEntry {
                line1,
                line2: line2.to_string(),
            },
        );
    }

    if entries.is_empty() {
        return Err(EphemerisError::MalformedFile("no TLE entries found".into()));
    }

    Ok(SatelliteCatalog::from_entries(entries))
}

fn parse_norad_id(line1: &str) -> Result<i64> {
    line1
        .get(2..7)
        .map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| EphemerisError::MalformedFile(format!("unparseable NORAD id in: {line1}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // A real ISS-like TLE, epoch near 2024.
    const SAMPLE: &str = "\
ISS (ZARYA)
1 25544U 98067A   24001.50000000  .00016717  00000-0  10270-3 0  9994
2 25544  51.6400 208.9163 0006317  69.9862  25.2906 15.50377579999999
";

    #[test]
    fn parses_named_triple_and_propagates() {
        let catalog = parse_tle_text(SAMPLE).expect("parse");
        assert_eq!(catalog.len(), 1);

        let instant = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let sample = catalog.propagate(25544, instant).expect("propagate");
        let r = (sample.position.x.powi(2) + sample.position.y.powi(2) + sample.position.z.powi(2))
            .sqrt();
        assert!(r > 6600.0 && r < 7200.0, "unexpected LEO radius {r}");
    }

    #[test]
    fn unknown_sat_id_is_an_error() {
        let catalog = parse_tle_text(SAMPLE).expect("parse");
        let instant = Utc::now();
        let err = catalog.propagate(1, instant).unwrap_err();
        assert!(matches!(err, EphemerisError::UnknownSatellite(1)));
    }

    #[test]
    fn rejects_truncated_file() {
        let err = parse_tle_text("ISS (ZARYA)\n1 25544U 98067A\n").unwrap_err();
        assert!(matches!(err, EphemerisError::MalformedFile(_)));
    }

    #[test]
    fn load_tle_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tles.txt");
        std::fs::write(&path, SAMPLE).unwrap();

        let catalog = load_tle_file(&path).expect("load");
        assert_eq!(catalog.len(), 1);
    }
}
