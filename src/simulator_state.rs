use crate::chemical_model::ChemicalModel;
use crate::component::ComponentMasses;
use crate::constants::REFERENCE_TIME_TOLERANCE_MA;
use crate::error::SequencingError;
use crate::immobile_species::{ImmobileSpecies, ImmobileSpeciesId};
use crate::pvt::PhaseValues;
use crate::species_state::SpeciesState;

/// Lumped concentrations recomputed every step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LumpedConcentrations {
    pub total: f64,
    pub mobile: f64, // oil species
    pub aromatic_immobile: f64,
}

/// Cumulative expelled quantities, summed from the per-step instantaneous values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CumulativeExpulsion {
    pub oil_mass: f64,
    pub oil_volume: f64,
    pub hc_gas_volume: f64,
    pub wet_gas_volume: f64,
    pub c614_sat_plus_arom_volume: f64,
    pub aromatics_volume: f64,
    pub saturates_volume: f64,
}

/// Everything that evolves at one source-rock node between steps.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorState {
    species: Vec<SpeciesState>,
    reference_time: f64,
    time_direction: Option<f64>,
    last_time_step_size: f64,
    toc_at_vre05: Option<f64>,

    pub lumped: LumpedConcentrations,
    pub cumulative: CumulativeExpulsion,
    pub immobiles: ImmobileSpecies,

    pub initial_kerogen_concentration: f64, // concentration x thickness
    pub conc_ki: f64, // kg/m³ of organic matter per unit concentration
    pub initial_toc: f64,
    pub current_toc: f64,
    pub inorganic_density: f64,
    pub mean_bulk_density: f64,
    pub thickness: f64,

    pub liquid_components: ComponentMasses,
    pub vapour_components: ComponentMasses,
    pub sub_surface_densities: PhaseValues,
    pub retained_liquid_volume: f64, // m³ per m³ of rock
    pub retained_vapour_volume: f64, // m³ per m³ of rock
    pub effective_porosity: f64,
    pub hc_saturation: f64,
    pub irreducible_water_saturation: f64,
    pub total_gas_from_otgc: f64,
    pub vl_sr_temperature: f64,
    pub vl_reference_temperature: f64,
}

impl SimulatorState {
    pub fn new(model: &ChemicalModel, reference_time: f64) -> Self {
        let mut immobiles = ImmobileSpecies::default();
        for species in model.species() {
            if let Some(id) = ImmobileSpeciesId::from_str(species.name()) {
                immobiles.set_density(id, species.properties().density);
            }
        }

        Self {
            species: model.species().iter().map(|s| SpeciesState::new(s.name())).collect(),
            reference_time,
            time_direction: None,
            last_time_step_size: 0.0,
            toc_at_vre05: None,
            lumped: LumpedConcentrations::default(),
            cumulative: CumulativeExpulsion::default(),
            immobiles,
            initial_kerogen_concentration: 0.0,
            conc_ki: 0.0,
            initial_toc: 0.0,
            current_toc: 0.0,
            inorganic_density: 0.0,
            mean_bulk_density: 0.0,
            thickness: 0.0,
            liquid_components: ComponentMasses::zero(),
            vapour_components: ComponentMasses::zero(),
            sub_surface_densities: PhaseValues::default(),
            retained_liquid_volume: 0.0,
            retained_vapour_volume: 0.0,
            effective_porosity: 0.0,
            hc_saturation: 0.0,
            irreducible_water_saturation: 0.0,
            total_gas_from_otgc: 0.0,
            vl_sr_temperature: 0.0,
            vl_reference_temperature: 0.0,
        }
    }

    /// States in chemical-model species order.
    pub fn species_states(&self) -> &[SpeciesState] {
        &self.species
    }

    pub fn species_states_mut(&mut self) -> &mut [SpeciesState] {
        &mut self.species
    }

    pub fn species_state(&self, name: &str) -> Option<&SpeciesState> {
        self.species.iter().find(|s| s.name == name)
    }

    pub fn species_state_mut(&mut self, name: &str) -> Option<&mut SpeciesState> {
        self.species.iter_mut().find(|s| s.name == name)
    }

    pub fn species_concentration(&self, name: &str) -> f64 {
        self.species_state(name).map(|s| s.concentration).unwrap_or(0.0)
    }

    pub fn concentrations(&self) -> Vec<f64> {
        self.species.iter().map(|s| s.concentration).collect()
    }

    pub fn reference_time(&self) -> f64 {
        self.reference_time
    }

    pub fn last_time_step_size(&self) -> f64 {
        self.last_time_step_size
    }

    /// Validates a step from the reference time to `time` and returns its size.
    ///
    /// `expected_previous` is the start time declared by the input, if any.
    pub fn check_step(&self, expected_previous: Option<f64>, time: f64) -> Result<f64, SequencingError> {
        if let Some(previous) = expected_previous {
            if (previous - self.reference_time).abs() > REFERENCE_TIME_TOLERANCE_MA {
                return Err(SequencingError::OutOfOrder {
                    expected: self.reference_time,
                    found: previous,
                });
            }
        }

        let delta = time - self.reference_time;
        if delta.abs() <= REFERENCE_TIME_TOLERANCE_MA {
            return Err(SequencingError::NonAdvancingStep { time });
        }
        if let Some(direction) = self.time_direction {
            if delta.signum() != direction {
                return Err(SequencingError::WrongDirection {
                    reference: self.reference_time,
                    time,
                });
            }
        }
        Ok(delta.abs())
    }

    pub(crate) fn commit_step(&mut self, time: f64) {
        let delta = time - self.reference_time;
        self.time_direction.get_or_insert(delta.signum());
        self.last_time_step_size = delta.abs();
        self.reference_time = time;
    }

    pub fn set_lumped_to_zero(&mut self) {
        self.lumped = LumpedConcentrations::default();
    }

    pub fn update_lumped(&mut self, total: f64, mobile: f64, aromatic_immobile: f64) {
        self.lumped.total += total;
        self.lumped.mobile += mobile;
        self.lumped.aromatic_immobile += aromatic_immobile;
    }

    /// Aromatic immobile weight fraction.
    pub fn waso(&self) -> f64 {
        if self.lumped.total > 0.0 {
            self.lumped.aromatic_immobile / self.lumped.total
        } else {
            0.0
        }
    }

    /// Mobile (bitumen) weight fraction.
    pub fn wbo(&self) -> f64 {
        if self.lumped.total > 0.0 {
            self.lumped.mobile / self.lumped.total
        } else {
            0.0
        }
    }

    pub fn toc_at_vre05(&self) -> Option<f64> {
        self.toc_at_vre05
    }

    /// Stores the first value offered and returns the stored one.
    pub(crate) fn capture_toc_at_vre05(&mut self, toc: f64) -> f64 {
        *self.toc_at_vre05.get_or_insert(toc)
    }

    pub fn retained_species_mass(&self, name: &str) -> f64 {
        self.species_state(name).map(|s| s.retained).unwrap_or(0.0)
    }
}
