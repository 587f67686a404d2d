// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::{Deserialize, Serialize};
use serde_json::Value;

const EARTH_RADIUS_M: f64 = 6_378_137.0;
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_6;

/// Spatial reference identified by its well-known ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialReference {
    pub wkid: u32,
}

impl SpatialReference {
    pub const WGS84: Self = Self { wkid: 4326 };
    pub const WEB_MERCATOR: Self = Self { wkid: 3857 };
}

/// Point geometry. `x`/`y` are longitude/latitude for WGS84.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    pub spatial_reference: SpatialReference,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64, spatial_reference: SpatialReference) -> Self {
        Self {
            x,
            y,
            z: None,
            spatial_reference,
        }
    }

    #[must_use]
    pub fn wgs84(longitude: f64, latitude: f64) -> Self {
        Self::new(longitude, latitude, SpatialReference::WGS84)
    }

    #[must_use]
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    /// Spherical Web Mercator projection of a WGS84 point.
    ///
    /// Points already in Web Mercator are returned unchanged; latitude is
    /// clamped to the usual Mercator limit.
    #[must_use]
    pub fn to_web_mercator(&self) -> Point {
        if self.spatial_reference == SpatialReference::WEB_MERCATOR {
            return *self;
        }
        let lat = self.y.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
        let x = EARTH_RADIUS_M * self.x.to_radians();
        let y = EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        Point {
            x,
            y,
            z: self.z,
            spatial_reference: SpatialReference::WEB_MERCATOR,
        }
    }

    /// Geometry JSON as sent to the host.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_shape_without_z() {
        let p = Point::wgs84(21.0, 52.25);
        assert_eq!(
            p.to_json(),
            json!({"x": 21.0, "y": 52.25, "spatialReference": {"wkid": 4326}})
        );
    }

    #[test]
    fn test_json_shape_with_z() {
        let p = Point::wgs84(1.0, 2.0).with_z(110.5);
        assert_eq!(p.to_json()["z"], json!(110.5));
    }

    #[test]
    fn test_web_mercator_origin() {
        let p = Point::wgs84(0.0, 0.0).to_web_mercator();
        assert_eq!(p.spatial_reference, SpatialReference::WEB_MERCATOR);
        assert!(p.x.abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
    }

    #[test]
    fn test_web_mercator_known_value() {
        let p = Point::wgs84(180.0, 0.0).to_web_mercator();
        assert!((p.x - 20_037_508.342_789_244).abs() < 1e-3);
    }

    #[test]
    fn test_web_mercator_is_idempotent() {
        let p = Point::wgs84(10.0, 45.0).to_web_mercator();
        assert_eq!(p.to_web_mercator(), p);
    }
}
