use std::cmp::Reverse;
use std::collections::HashSet;

use tracing::warn;

use crate::error::ScrapeError;
use crate::geojson::{Feature, Geometry};
use crate::parser::RawRecord;

/// `(lat, lon)` parsed from `coord_gps`. Only ever compared for identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateKey {
    pub lat: f64,
    pub lon: f64,
}

impl CoordinateKey {
    /// `"lat,lon"`: exactly two comma-separated finite numbers, whitespace
    /// around each allowed.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split(',');
        let lat = parse_part(parts.next()?)?;
        let lon = parse_part(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { lat, lon })
    }

    /// Set identity. `+ 0.0` folds `-0.0` into `0.0`.
    fn bits(self) -> (u64, u64) {
        ((self.lat + 0.0).to_bits(), (self.lon + 0.0).to_bits())
    }
}

fn parse_part(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Output of [`dedup`]. `features + duplicates + malformed == total`.
#[derive(Debug, Default)]
pub struct Dedup {
    pub features: Vec<Feature>,
    pub total: usize,
    pub duplicates: usize,
    pub malformed: usize,
}

/// Sort by `id` descending (stable), keep the first record seen at each
/// coordinate, and turn survivors into point features.
///
/// A record with an unusable `coord_gps` is skipped and counted, or aborts
/// the run when `strict` is set.
pub fn dedup(mut records: Vec<RawRecord>, strict: bool) -> Result<Dedup, ScrapeError> {
    records.sort_by_key(|r| Reverse(r.id()));

    let mut out = Dedup {
        total: records.len(),
        ..Default::default()
    };
    let mut seen = HashSet::new();

    for record in records {
        let Some(key) = record.coord_gps().and_then(CoordinateKey::parse) else {
            let value = record.coord_gps().unwrap_or_default().to_string();
            if strict {
                return Err(ScrapeError::MalformedCoordinate {
                    id: record.id(),
                    value,
                });
            }
            warn!("Skipping record {}: malformed coord_gps {:?}", record.id(), value);
            out.malformed += 1;
            continue;
        };

        if !seen.insert(key.bits()) {
            out.duplicates += 1;
            continue;
        }

        out.features.push(Feature {
            geometry: Geometry::Point {
                coordinates: [key.lon, key.lat],
            },
            properties: record.into_properties(),
        });
    }

    Ok(out)
}
