//! Synthetic fleet generator
//!
//! Drives a simulated fleet toward the destination, one movement step per
//! fetch. Used for demos and for running the full pipeline without a live
//! telemetry endpoint. Seedable for deterministic tests.

use std::sync::Mutex;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::IngestError;
use super::record::RawFix;
use super::FixSource;
use crate::geo::{self, GeoPoint};

/// Vehicles this close to the destination park there.
const HOLD_RADIUS_M: f64 = 20.0;

/// Tuning for the simulated fleet.
#[derive(Debug, Clone)]
pub struct SyntheticFleetConfig {
    pub vehicle_count: usize,
    pub destination: GeoPoint,
    /// Starting ring around the destination, meters
    pub min_start_distance_m: f64,
    pub max_start_distance_m: f64,
    pub min_speed_kmh: f64,
    pub max_speed_kmh: f64,
    /// Chance per step that a moving vehicle pulls over for a few steps
    pub dwell_probability: f64,
    /// Simulated wall-clock seconds advanced per fetch
    pub step_secs: f64,
    /// Fixed RNG seed; None seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SyntheticFleetConfig {
    fn default() -> Self {
        Self {
            vehicle_count: 5,
            destination: GeoPoint {
                lat: -1.9536,
                lon: 30.0606,
            },
            min_start_distance_m: 3_000.0,
            max_start_distance_m: 8_000.0,
            min_speed_kmh: 25.0,
            max_speed_kmh: 60.0,
            dwell_probability: 0.1,
            step_secs: 10.0,
            seed: None,
        }
    }
}

#[derive(Debug)]
struct SyntheticVehicle {
    id: String,
    plate: String,
    position: GeoPoint,
    speed_kmh: f64,
    dwell_steps: u32,
}

#[derive(Debug)]
struct SyntheticState {
    rng: StdRng,
    vehicles: Vec<SyntheticVehicle>,
}

/// A [`FixSource`] producing fixes from simulated vehicles.
pub struct SyntheticFleet {
    config: SyntheticFleetConfig,
    state: Mutex<SyntheticState>,
}

impl SyntheticFleet {
    pub fn new(config: SyntheticFleetConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let vehicles = (0..config.vehicle_count)
            .map(|i| {
                let bearing = rng.gen_range(0.0..360.0);
                let distance =
                    rng.gen_range(config.min_start_distance_m..=config.max_start_distance_m);
                SyntheticVehicle {
                    id: format!("SIM-{:03}", i + 1),
                    plate: format!("SIM {:03}", i + 1),
                    position: geo::project_position(config.destination, bearing, distance),
                    speed_kmh: rng.gen_range(config.min_speed_kmh..=config.max_speed_kmh),
                    dwell_steps: 0,
                }
            })
            .collect();

        Self {
            config,
            state: Mutex::new(SyntheticState { rng, vehicles }),
        }
    }

    /// Moves every vehicle one step along its run.
    fn advance(&self, state: &mut SyntheticState) {
        let SyntheticState { rng, vehicles } = state;

        for vehicle in vehicles.iter_mut() {
            let remaining = geo::haversine_distance_m(vehicle.position, self.config.destination);
            if remaining <= HOLD_RADIUS_M {
                vehicle.speed_kmh = 0.0;
                continue;
            }

            if vehicle.dwell_steps > 0 {
                vehicle.dwell_steps -= 1;
                vehicle.speed_kmh = 0.0;
                continue;
            }

            if self.config.dwell_probability > 0.0 && rng.gen_bool(self.config.dwell_probability) {
                vehicle.dwell_steps = rng.gen_range(1..=3);
                vehicle.speed_kmh = 0.0;
                continue;
            }

            if vehicle.speed_kmh <= 0.0 {
                vehicle.speed_kmh =
                    rng.gen_range(self.config.min_speed_kmh..=self.config.max_speed_kmh);
            }
            vehicle.speed_kmh = (vehicle.speed_kmh * rng.gen_range(0.9..1.1))
                .clamp(self.config.min_speed_kmh, self.config.max_speed_kmh);

            // Head for the destination with a little wander
            let bearing = geo::initial_bearing_deg(vehicle.position, self.config.destination)
                + rng.gen_range(-8.0..8.0);
            let travel = (vehicle.speed_kmh / 3.6 * self.config.step_secs).min(remaining);
            vehicle.position = geo::project_position(vehicle.position, bearing, travel);
        }
    }
}

impl FixSource for SyntheticFleet {
    async fn fetch_fleet(&self) -> Result<Vec<RawFix>, IngestError> {
        let mut state = self.state.lock().unwrap();
        self.advance(&mut state);

        let observed_at = Utc::now();
        Ok(state
            .vehicles
            .iter()
            .map(|vehicle| RawFix {
                vehicle_id: vehicle.id.clone(),
                plate_label: vehicle.plate.clone(),
                position: vehicle.position,
                speed_kmh: Some(vehicle.speed_kmh),
                observed_at,
            })
            .collect())
    }
}
