//! Time-of-flight to energy calibration hook.
//!
//! The reshape step only converts the energy axis when both an energy
//! offset and a time offset are supplied. The conversion itself is
//! instrument-specific and plugged in through [`EnergyCalibration`].

use ndarray::{Array1, ArrayView1};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Converts time-of-flight axis values into energy axis values.
pub trait EnergyCalibration {
    /// Maps each time-of-flight value to an energy value.
    fn tof_to_energy(
        &self,
        tof: ArrayView1<'_, f64>,
        energy_offset: f64,
        tof_offset: f64,
    ) -> Array1<f64>;
}

impl<F> EnergyCalibration for F
where
    F: Fn(ArrayView1<'_, f64>, f64, f64) -> Array1<f64>,
{
    fn tof_to_energy(
        &self,
        tof: ArrayView1<'_, f64>,
        energy_offset: f64,
        tof_offset: f64,
    ) -> Array1<f64> {
        self(tof, energy_offset, tof_offset)
    }
}

/// Non-relativistic kinetic energy (eV) of a particle crossing a field-free
/// flight path.
///
/// `E = m/2 * (L / ((t - tof_offset) * time_unit_s))^2 / e - energy_offset`.
/// Non-positive flight times map to 0.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlightPathCalibration {
    /// Flight path length in metres.
    pub flight_path_m: f64,
    /// Particle rest mass in kilograms.
    pub particle_mass_kg: f64,
    /// Seconds per time-of-flight axis unit.
    pub time_unit_s: f64,
}

impl FlightPathCalibration {
    /// Electron rest mass (kg).
    pub const ELECTRON_MASS_KG: f64 = 9.109_383_701_5e-31;

    /// Electron calibration with a time axis in nanoseconds.
    #[must_use]
    pub fn electron(flight_path_m: f64) -> Self {
        Self {
            flight_path_m,
            particle_mass_kg: Self::ELECTRON_MASS_KG,
            time_unit_s: 1.0e-9,
        }
    }

    /// Sets the time axis unit in seconds.
    #[must_use]
    pub fn with_time_unit_s(mut self, time_unit_s: f64) -> Self {
        self.time_unit_s = time_unit_s;
        self
    }

    fn energy_ev(&self, tof: f64, energy_offset: f64, tof_offset: f64) -> f64 {
        let t_s = (tof - tof_offset) * self.time_unit_s;
        if t_s <= 0.0 {
            0.0
        } else {
            0.5 * self.particle_mass_kg * (self.flight_path_m / t_s).powi(2) / ELEMENTARY_CHARGE
                - energy_offset
        }
    }
}

impl EnergyCalibration for FlightPathCalibration {
    fn tof_to_energy(
        &self,
        tof: ArrayView1<'_, f64>,
        energy_offset: f64,
        tof_offset: f64,
    ) -> Array1<f64> {
        tof.mapv(|t| self.energy_ev(t, energy_offset, tof_offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn test_electron_energy() {
        // 1 m in 1 us -> v = 1e6 m/s -> ~2.843 eV
        let calibration = FlightPathCalibration::electron(1.0);
        let tof = arr1(&[1000.0]);
        let energy = calibration.tof_to_energy(tof.view(), 0.0, 0.0);
        assert_relative_eq!(energy[0], 2.842_815, epsilon = 1e-5);
    }

    #[test]
    fn test_offsets_applied() {
        let calibration = FlightPathCalibration::electron(1.0);
        let tof = arr1(&[1100.0, 50.0]);
        let energy = calibration.tof_to_energy(tof.view(), 0.5, 100.0);
        assert_relative_eq!(energy[0], 2.842_815 - 0.5, epsilon = 1e-5);
        assert_eq!(energy[1], 0.0);
    }

    fn linear(tof: ArrayView1<'_, f64>, e0: f64, t0: f64) -> Array1<f64> {
        tof.mapv(|t| 2.0 * (t - t0) - e0)
    }

    #[test]
    fn test_function_calibration() {
        let tof = arr1(&[1.0, 2.0]);
        let energy = linear.tof_to_energy(tof.view(), 1.0, 0.5);
        assert_eq!(energy, arr1(&[0.0, 2.0]));
    }
}
