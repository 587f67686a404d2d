// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Synthetic fixes walking clockwise around a circle.

use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use locdisp_core::{Location, LocationSource, Point, SimulatedSource};

use crate::config::SourceConfig;

const METRES_PER_DEGREE: f64 = 111_320.0;

#[derive(Debug, Clone)]
pub struct CircleWalk {
    origin_latitude: f64,
    origin_longitude: f64,
    radius_m: f64,
    speed_mps: f64,
    accuracy_m: f64,
    /// Clockwise from north, radians.
    angle: f64,
}

impl CircleWalk {
    pub fn from_config(cfg: &SourceConfig) -> Self {
        Self {
            origin_latitude: cfg.origin_latitude,
            origin_longitude: cfg.origin_longitude,
            radius_m: cfg.radius_m,
            speed_mps: cfg.speed_mps,
            accuracy_m: cfg.horizontal_accuracy_m,
            angle: 0.0,
        }
    }

    /// Advance by `elapsed` and return the resulting fix.
    pub fn step(&mut self, elapsed: Duration) -> Location {
        let moving = self.radius_m > 0.0 && self.speed_mps > 0.0;
        if moving {
            let arc = self.speed_mps * elapsed.as_secs_f64();
            self.angle = (self.angle + arc / self.radius_m).rem_euclid(TAU);
        }

        let north = self.radius_m * self.angle.cos();
        let east = self.radius_m * self.angle.sin();
        let latitude = self.origin_latitude + north / METRES_PER_DEGREE;
        let longitude = self.origin_longitude
            + east / (METRES_PER_DEGREE * self.origin_latitude.to_radians().cos().max(1e-6));

        Location {
            course: (self.angle.to_degrees() + 90.0).rem_euclid(360.0),
            horizontal_accuracy: self.accuracy_m,
            vertical_accuracy: self.accuracy_m * 1.5,
            velocity: if moving { self.speed_mps } else { 0.0 },
            ..Location::new(Point::wgs84(longitude, latitude))
        }
    }
}

/// Push a fix every `period` while the source is started.
pub async fn run_walker(
    source: Arc<SimulatedSource>,
    mut walk: CircleWalk,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("Simulated walk running (update every {:?})", period);
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if source.is_started() {
                    let location = walk.step(period);
                    debug!(
                        "Simulated fix {:.6},{:.6} course {:.1}",
                        location.position.y, location.position.x, location.course
                    );
                    source.push_location(location);
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    debug!("Simulated walk stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use locdisp_core::StartBehavior;

    fn walk(radius_m: f64) -> CircleWalk {
        CircleWalk::from_config(&SourceConfig {
            origin_latitude: 0.0,
            origin_longitude: 0.0,
            radius_m,
            speed_mps: 2.0,
            ..SourceConfig::default()
        })
    }

    #[test]
    fn test_first_fix_is_north_of_origin() {
        let mut walk = walk(100.0);
        let fix = walk.step(Duration::ZERO);
        assert!((fix.position.y - 100.0 / METRES_PER_DEGREE).abs() < 1e-9);
        assert!(fix.position.x.abs() < 1e-9);
        assert!((fix.course - 90.0).abs() < 1e-9);
        assert_eq!(fix.velocity, 2.0);
    }

    #[test]
    fn test_quarter_circle_heads_south() {
        let mut walk = walk(100.0);
        let quarter = Duration::from_secs_f64(std::f64::consts::FRAC_PI_2 * 100.0 / 2.0);
        let fix = walk.step(quarter);
        assert!(fix.position.y.abs() < 1e-6);
        assert!(fix.position.x > 0.0);
        assert!((fix.course - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_radius_stays_put() {
        let mut walk = walk(0.0);
        let fix = walk.step(Duration::from_secs(10));
        assert_eq!(fix.position, Point::wgs84(0.0, 0.0));
        assert_eq!(fix.velocity, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_walker_only_pushes_while_started() {
        let source = Arc::new(SimulatedSource::with_start_behavior(StartBehavior::Succeed));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_walker(
            source.clone(),
            walk(50.0),
            Duration::from_millis(100),
            shutdown_rx,
        ));

        time::sleep(Duration::from_millis(350)).await;
        assert!(source.location().is_none());

        source.start();
        time::sleep(Duration::from_millis(350)).await;
        assert!(source.location().is_some());

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
