use crate::constants::TO_KELVIN;
use serde::{Deserialize, Serialize};

/// Environmental conditions at one time instance for one source-rock node.
///
/// Times are in Ma, temperatures in °C, pressures in Pa, permeability in mD.
/// The `previous_*` fields describe the start of the step; when unset the
/// step is assumed to start from the node's reference state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRockNodeInput {
    pub current_time: f64,
    pub previous_time: Option<f64>,
    pub temperature_c: f64,
    pub previous_temperature_c: Option<f64>,
    /// Vertical effective stress driving the kinetics.
    pub pressure: f64,
    pub lithostatic_pressure: f64,
    pub hydrostatic_pressure: f64,
    pub pore_pressure: f64,
    pub previous_pore_pressure: Option<f64>,
    pub porosity: f64,
    pub permeability: f64,
    pub vre: f64,
    pub thickness_scale_factor: f64,
    pub i: usize,
    pub j: usize,
}

impl SourceRockNodeInput {
    pub fn new(current_time: f64, temperature_c: f64, pressure: f64) -> Self {
        Self {
            current_time,
            previous_time: None,
            temperature_c,
            previous_temperature_c: None,
            pressure,
            lithostatic_pressure: 0.0,
            hydrostatic_pressure: 0.0,
            pore_pressure: 0.0,
            previous_pore_pressure: None,
            porosity: 0.0,
            permeability: 0.0,
            vre: 0.0,
            thickness_scale_factor: 1.0,
            i: 0,
            j: 0,
        }
    }

    pub fn with_pressures(mut self, lithostatic: f64, hydrostatic: f64, pore: f64) -> Self {
        self.lithostatic_pressure = lithostatic;
        self.hydrostatic_pressure = hydrostatic;
        self.pore_pressure = pore;
        self
    }

    pub fn with_rock_properties(mut self, porosity: f64, permeability: f64) -> Self {
        self.porosity = porosity;
        self.permeability = permeability;
        self
    }

    pub fn with_vre(mut self, vre: f64) -> Self {
        self.vre = vre;
        self
    }

    pub fn with_indices(mut self, i: usize, j: usize) -> Self {
        self.i = i;
        self.j = j;
        self
    }

    pub fn with_thickness_scale_factor(mut self, factor: f64) -> Self {
        self.thickness_scale_factor = factor;
        self
    }

    /// Marks this input as the step that follows `prior`.
    pub fn chained_after(mut self, prior: &SourceRockNodeInput) -> Self {
        self.previous_time = Some(prior.current_time);
        self.previous_temperature_c = Some(prior.temperature_c);
        self.previous_pore_pressure = Some(prior.pore_pressure);
        self
    }

    pub fn temperature_k(&self) -> f64 {
        self.temperature_c + TO_KELVIN
    }

    pub fn previous_temperature_celsius(&self) -> f64 {
        self.previous_temperature_c.unwrap_or(self.temperature_c)
    }

    pub fn previous_pore_pressure(&self) -> f64 {
        self.previous_pore_pressure.unwrap_or(self.pore_pressure)
    }

    pub fn start_time(&self) -> f64 {
        self.previous_time.unwrap_or(self.current_time)
    }

    /// Linear interpolation of every condition between two inputs at `time`.
    ///
    /// The result carries no step-start information; chain it explicitly.
    pub fn interpolate(time: f64, start: &SourceRockNodeInput, end: &SourceRockNodeInput) -> Self {
        let span = end.current_time - start.current_time;
        let fraction = if span.abs() > 0.0 {
            (time - start.current_time) / span
        } else {
            1.0
        };
        let lerp = |a: f64, b: f64| a + (b - a) * fraction;

        Self {
            current_time: time,
            previous_time: None,
            temperature_c: lerp(start.temperature_c, end.temperature_c),
            previous_temperature_c: None,
            pressure: lerp(start.pressure, end.pressure),
            lithostatic_pressure: lerp(start.lithostatic_pressure, end.lithostatic_pressure),
            hydrostatic_pressure: lerp(start.hydrostatic_pressure, end.hydrostatic_pressure),
            pore_pressure: lerp(start.pore_pressure, end.pore_pressure),
            previous_pore_pressure: None,
            porosity: lerp(start.porosity, end.porosity),
            permeability: lerp(start.permeability, end.permeability),
            vre: lerp(start.vre, end.vre),
            thickness_scale_factor: lerp(start.thickness_scale_factor, end.thickness_scale_factor),
            i: end.i,
            j: end.j,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interpolate_midpoint() {
        let start = SourceRockNodeInput::new(100.0, 20.0, 1.0e7).with_vre(0.3);
        let end = SourceRockNodeInput::new(90.0, 60.0, 3.0e7).with_vre(0.7);

        let mid = SourceRockNodeInput::interpolate(95.0, &start, &end);
        assert_eq!(mid.current_time, 95.0);
        assert_relative_eq!(mid.temperature_c, 40.0, epsilon = 1e-12);
        assert_relative_eq!(mid.pressure, 2.0e7, epsilon = 1e-6);
        assert_relative_eq!(mid.vre, 0.5, epsilon = 1e-12);
        assert_eq!(mid.previous_time, None);
    }

    #[test]
    fn test_chaining_sets_step_start() {
        let first = SourceRockNodeInput::new(100.0, 20.0, 1.0e7).with_pressures(2.0e7, 1.0e7, 1.1e7);
        let second = SourceRockNodeInput::new(99.0, 25.0, 1.1e7).chained_after(&first);

        assert_eq!(second.start_time(), 100.0);
        assert_eq!(second.previous_temperature_celsius(), 20.0);
        assert_eq!(second.previous_pore_pressure(), 1.1e7);
        assert_relative_eq!(second.temperature_k(), 298.15, epsilon = 1e-12);
    }
}
