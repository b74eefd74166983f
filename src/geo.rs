//! Geographic resolution of customer locations
//!
//! Customer location strings are joined against a city reference table on
//! (location, iso2). When fewer than half the customers match, the city join
//! is considered unreliable and the country table is tried instead; when that
//! also matches nothing the result is an explicit no-data value, never an
//! error. The 0.5 cutoff is a heuristic, not a statistically derived figure.

use crate::data::{CityRef, CountryRef, CustomerData, CustomerRecord};
use std::collections::{BTreeMap, HashMap};

/// Minimum fraction of customers that must match the city table for the
/// city-level join to be accepted as authoritative.
pub const CITY_MATCH_THRESHOLD: f64 = 0.5;

/// Which reference table the resolution ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    City,
    Country,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::City => "city",
            MatchType::Country => "country",
        }
    }
}

/// One resolved location with aggregated customer count and spend.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub location: String,
    pub lat: f64,
    pub lng: f64,
    pub total_customers: usize,
    pub total_spent: f64,
}

/// Aggregated result of a successful resolution. The map center is the
/// coordinate of the highest-spend location, not a centroid.
#[derive(Debug, Clone)]
pub struct GeoSummary {
    pub match_type: MatchType,
    pub points: Vec<GeoPoint>,
    pub center: (f64, f64),
}

/// Resolution outcome. `NoData` is a valid empty state the caller renders
/// as "no data to display".
#[derive(Debug, Clone)]
pub enum GeoResolution {
    Resolved(GeoSummary),
    NoData,
}

/// Resolve customer locations against the city table first, falling back to
/// the country table below [`CITY_MATCH_THRESHOLD`].
pub fn resolve_customer_geo(
    customers: &CustomerData,
    cities: &[CityRef],
    countries: &[CountryRef],
) -> GeoResolution {
    let total = customers.records.len();
    if total == 0 {
        return GeoResolution::NoData;
    }

    let city_index = build_city_index(cities);
    let city_matches = match_customers(&customers.records, &city_index);
    let match_rate = city_matches.len() as f64 / total as f64;

    let (matches, match_type) = if match_rate >= CITY_MATCH_THRESHOLD {
        (city_matches, MatchType::City)
    } else {
        let country_index = build_country_index(countries);
        let country_matches = match_customers(&customers.records, &country_index);
        if country_matches.is_empty() {
            return GeoResolution::NoData;
        }
        (country_matches, MatchType::Country)
    };

    let points = aggregate_points(matches);
    if points.is_empty() {
        return GeoResolution::NoData;
    }

    let center = points
        .iter()
        .max_by(|a, b| {
            a.total_spent
                .partial_cmp(&b.total_spent)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|p| (p.lat, p.lng))
        .unwrap_or((0.0, 0.0));

    GeoResolution::Resolved(GeoSummary {
        match_type,
        points,
        center,
    })
}

/// (normalized location, normalized iso2) -> coordinates. First occurrence
/// wins when the reference table carries duplicates.
fn build_city_index(cities: &[CityRef]) -> HashMap<(String, String), (f64, f64)> {
    let mut index = HashMap::new();
    for city in cities {
        index
            .entry((normalize(&city.city), normalize(&city.iso2)))
            .or_insert((city.lat, city.lng));
    }
    index
}

fn build_country_index(countries: &[CountryRef]) -> HashMap<(String, String), (f64, f64)> {
    let mut index = HashMap::new();
    for country in countries {
        index
            .entry((normalize(&country.country), normalize(&country.iso2)))
            .or_insert((country.lat, country.lng));
    }
    index
}

fn match_customers<'a>(
    records: &'a [CustomerRecord],
    index: &HashMap<(String, String), (f64, f64)>,
) -> Vec<(&'a CustomerRecord, String, (f64, f64))> {
    records
        .iter()
        .filter_map(|record| {
            let key = (normalize(&record.location), normalize(&record.iso2));
            index
                .get(&key)
                .map(|&coords| (record, key.0.clone(), coords))
        })
        .collect()
}

fn aggregate_points(matches: Vec<(&CustomerRecord, String, (f64, f64))>) -> Vec<GeoPoint> {
    // Keyed by location string; the coordinate is shared by construction
    let mut grouped: BTreeMap<String, (f64, f64, usize, f64)> = BTreeMap::new();
    for (record, location, (lat, lng)) in matches {
        let entry = grouped.entry(location).or_insert((lat, lng, 0, 0.0));
        entry.2 += 1;
        entry.3 += record.total_spent;
    }
    grouped
        .into_iter()
        .map(|(location, (lat, lng, total_customers, total_spent))| GeoPoint {
            location,
            lat,
            lng,
            total_customers,
            total_spent,
        })
        .collect()
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}
