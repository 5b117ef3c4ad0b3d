use crate::chemical_model::ChemicalModel;
use crate::config::GenexConfig;
use crate::constants::{BOLTZMANN_OVER_PLANCK_PER_K_MA, TO_KELVIN};
use crate::error::GenexError;
use crate::species::StepConditions;
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub const OTGC_DIRECTORY_ENV: &str = "OTGCDIR";
pub const OTGC_CONFIG_FILE: &str = "OTGC.cfg";

/// Secondary cracking of retained hydrocarbons in a closed system.
#[derive(Debug, Clone)]
pub struct OtgcSimulator {
    model: Arc<ChemicalModel>,
    maximum_time_step_size: f64,
}

impl OtgcSimulator {
    pub fn new(model: Arc<ChemicalModel>, maximum_time_step_size: f64) -> Self {
        Self {
            model,
            maximum_time_step_size,
        }
    }

    /// Builds the cracking network from a configuration; compositions and kinetics are taken as written.
    pub fn from_config(config: &GenexConfig) -> Result<Self, GenexError> {
        let properties = config.simulator_properties()?;
        let params = config.general_parameters(properties.use_default_general_parameters)?;
        let mut model = config.build_chemical_model(params)?;
        model.update_species_properties();
        model.compute_factors()?;
        Ok(Self::new(Arc::new(model), properties.maximum_time_step_size))
    }

    pub fn from_directory<P: AsRef<Path>>(directory: P) -> Result<Self, GenexError> {
        let config = GenexConfig::load(directory.as_ref().join(OTGC_CONFIG_FILE))?;
        Self::from_config(&config)
    }

    /// Loads the kernel from `$OTGCDIR`; secondary cracking is disabled when that fails.
    pub fn from_environment() -> Option<Self> {
        let Ok(directory) = std::env::var(OTGC_DIRECTORY_ENV) else {
            warn!("{} is not set, secondary cracking is disabled", OTGC_DIRECTORY_ENV);
            return None;
        };
        match Self::from_directory(&directory) {
            Ok(simulator) => {
                info!("secondary cracking network loaded from {}", directory);
                Some(simulator)
            }
            Err(e) => {
                warn!("cannot load secondary cracking network from {}: {}", directory, e);
                None
            }
        }
    }

    pub fn model(&self) -> &ChemicalModel {
        &self.model
    }

    pub fn maximum_time_step_size(&self) -> f64 {
        self.maximum_time_step_size
    }

    /// Cracks `concentrations` (keyed by species name) over one interval, with
    /// temperature (°C) and pressure (Pa) varying linearly from start to end.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_interval(
        &self,
        concentrations: &mut BTreeMap<String, f64>,
        start_temperature_c: f64,
        end_temperature_c: f64,
        start_pressure: f64,
        end_pressure: f64,
        start_time: f64,
        end_time: f64,
    ) {
        let interval = (end_time - start_time).abs();
        if interval <= 0.0 {
            return;
        }
        let steps = if self.maximum_time_step_size > 0.0 && interval > self.maximum_time_step_size {
            (interval / self.maximum_time_step_size).ceil() as usize
        } else {
            1
        };
        let dt = interval / steps as f64;
        let params = self.model.params();

        let species = self.model.species();
        let mut values: Vec<f64> = species
            .iter()
            .map(|s| concentrations.get(s.name()).copied().unwrap_or(0.0))
            .collect();
        let mut pending = vec![0.0; species.len()];

        for step in 1..=steps {
            let fraction = step as f64 / steps as f64;
            let temperature_k =
                start_temperature_c + (end_temperature_c - start_temperature_c) * fraction + TO_KELVIN;
            let conditions = StepConditions {
                time_step_size: dt,
                effective_pressure: start_pressure + (end_pressure - start_pressure) * fraction,
                temperature_k,
                frequency_factor: BOLTZMANN_OVER_PLANCK_PER_K_MA * temperature_k,
                kerogen_transformation_ratio: 1.0,
                diffusion_conc_dependence: 0.0,
                vogel_fulcher_temperature: params.t0_torbanite + params.tuning_const,
                open_conditions: false,
            };
            if let Err(err) = self.model.advance_closed_system(&mut values, &mut pending, &conditions) {
                warn!("secondary cracking skipped: {}", err);
                return;
            }
        }

        for ((s, value), generated) in species.iter().zip(values).zip(pending) {
            concentrations.insert(s.name().to_string(), value + generated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use more_asserts::assert_gt;

    fn kernel() -> OtgcSimulator {
        OtgcSimulator::from_config(&GenexConfig::default_config()).unwrap()
    }

    #[test]
    fn test_interval_conserves_mass_and_cracks_oil() {
        let otgc = kernel();
        let mut concentrations = BTreeMap::new();
        concentrations.insert("C15+Sat".to_string(), 0.6);
        concentrations.insert("C1".to_string(), 0.4);
        concentrations.insert("unknown".to_string(), 0.25);

        otgc.compute_interval(&mut concentrations, 200.0, 220.0, 5.0e7, 5.0e7, 100.0, 95.0);

        let known: f64 = concentrations
            .iter()
            .filter(|(name, _)| name.as_str() != "unknown")
            .map(|(_, c)| c)
            .sum();
        assert_relative_eq!(known, 1.0, max_relative = 1e-9);
        assert_eq!(concentrations["unknown"], 0.25);
        assert_gt!(concentrations["C1"], 0.4);
        assert!(concentrations["C15+Sat"] < 0.6);
    }

    #[test]
    fn test_zero_interval_is_a_no_op() {
        let otgc = kernel();
        let mut concentrations = BTreeMap::new();
        concentrations.insert("C15+Sat".to_string(), 1.0);
        otgc.compute_interval(&mut concentrations, 200.0, 200.0, 1.0e7, 1.0e7, 10.0, 10.0);
        assert_eq!(concentrations.len(), 1);
        assert_eq!(concentrations["C15+Sat"], 1.0);
    }
}
