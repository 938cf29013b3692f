//! Query-string DTOs for the gateway endpoints.
//!
//! Every field is optional text so that malformed values reach the
//! validation rules (and produce an envelope) instead of failing extraction.

use serde::Deserialize;

/// `GET /apod/range`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApodRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub thumbs: Option<String>,
}

/// `GET /apod/random`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApodRandomQuery {
    pub count: Option<String>,
    pub thumbs: Option<String>,
}

/// `GET /mars-rover`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestPhotosQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// `GET /mars-rover/:rover`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoverPhotosQuery {
    pub sol: Option<String>,
    pub earth_date: Option<String>,
    pub camera: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// `GET /epic/dates`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpicDatesQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// `GET /asteroids/feed`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NeoFeedQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// `GET /media/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaSearchQuery {
    pub q: Option<String>,
    pub center: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub location: Option<String>,
    pub media_type: Option<String>,
    pub nasa_id: Option<String>,
    pub photographer: Option<String>,
    pub title: Option<String>,
    pub year_start: Option<String>,
    pub year_end: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// `GET /media/popular`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<String>,
}

/// `GET /eonet/events` and `/eonet/events/geojson`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EonetEventsQuery {
    pub status: Option<String>,
    pub limit: Option<String>,
    pub days: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub bbox: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// `GET /gibs/capabilities`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GibsCapabilitiesQuery {
    pub projection: Option<String>,
    pub service: Option<String>,
}

/// `GET /gibs/tile`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GibsTileQuery {
    pub layer: Option<String>,
    pub tilematrixset: Option<String>,
    pub tilematrix: Option<String>,
    pub tilerow: Option<String>,
    pub tilecol: Option<String>,
    pub time: Option<String>,
    pub format: Option<String>,
    pub projection: Option<String>,
}

/// `GET /gibs/map`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GibsMapQuery {
    pub layers: Option<String>,
    pub bbox: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub time: Option<String>,
    pub format: Option<String>,
    pub projection: Option<String>,
}

/// `GET /gibs/imagery`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GibsImageryQuery {
    pub date: Option<String>,
    pub layer: Option<String>,
    pub bbox: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epic_dates_type_field() {
        let query: EpicDatesQuery = serde_json::from_str(r#"{"type": "enhanced"}"#).unwrap();
        assert_eq!(query.kind.as_deref(), Some("enhanced"));
    }

    #[test]
    fn test_missing_fields_default_to_none() {
        let query: RoverPhotosQuery = serde_json::from_str("{}").unwrap();
        assert!(query.sol.is_none());
        assert!(query.per_page.is_none());
    }
}
