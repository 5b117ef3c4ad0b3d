// src/simulator.rs - per-node time-stepping driver around the shared chemical model

use crate::adsorption::AdsorptionSimulator;
use crate::chemical_model::ChemicalModel;
use crate::config::{GenexConfig, SIMULATOR_PROPERTIES_TABLE};
use crate::constants::*;
use crate::element::{CARBON, HYDROGEN};
use crate::error::{ConfigError, GenexError, Result, SequencingError};
use crate::general_parameters::GeneralParameters;
use crate::immobile_species::ImmobileSpeciesId;
use crate::node_input::SourceRockNodeInput;
use crate::node_output::SourceRockNodeOutput;
use crate::simulator_state::SimulatorState;
use crate::species::StepConditions;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Switches read from the `SimulatorProperties` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SimulatorProperties {
    pub preprocess_species_kinetics: bool,
    pub preprocess_species_composition: bool,
    pub use_default_general_parameters: bool,
    pub number_of_timesteps: u32,
    pub maximum_time_step_size: f64, // Ma
    pub simulate_open_conditions: bool,
    pub mass_balance_percent_tolerance: f64,
}

impl Default for SimulatorProperties {
    fn default() -> Self {
        Self {
            preprocess_species_kinetics: true,
            preprocess_species_composition: true,
            use_default_general_parameters: true,
            number_of_timesteps: 400,
            maximum_time_step_size: 1.0,
            simulate_open_conditions: true,
            mass_balance_percent_tolerance: 1.0,
        }
    }
}

impl SimulatorProperties {
    pub fn set_by_name(&mut self, key: &str, value: &str) -> std::result::Result<(), ConfigError> {
        match key {
            "PreprocessSpeciesKinetics" => self.preprocess_species_kinetics = parse_flag(key, value)?,
            "PreprocessSpeciesComposition" => self.preprocess_species_composition = parse_flag(key, value)?,
            "UseDefaultGeneralParameters" => self.use_default_general_parameters = parse_flag(key, value)?,
            "SimulateOpenConditions" => self.simulate_open_conditions = parse_flag(key, value)?,
            "NumberOfTimesteps" => self.number_of_timesteps = parse_number(value)?,
            "MaximumTimeStepSize" => self.maximum_time_step_size = parse_number(value)?,
            "MassBalancePercentTolerance" => self.mass_balance_percent_tolerance = parse_number(value)?,
            _ => return Err(ConfigError::UnknownParameter(key.to_string())),
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> std::result::Result<bool, ConfigError> {
    match value.trim() {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        other => Err(ConfigError::InvalidBoolean {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> std::result::Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        table: SIMULATOR_PROPERTIES_TABLE.to_string(),
        value: value.to_string(),
    })
}

/// Source-rock description that drives preprocessing of the early species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRockType {
    pub name: String,
    /// Atomic H/C of the kerogen, measured at `hc_vre`.
    pub initial_hc: f64,
    pub hc_vre: f64,
    /// Mean activation energy, J/mol.
    pub emean: f64,
    pub asphaltene_diffusion_energy: Option<f64>,
    pub resin_diffusion_energy: Option<f64>,
    pub c15_aro_diffusion_energy: Option<f64>,
    pub c15_sat_diffusion_energy: Option<f64>,
}

impl Default for SourceRockType {
    fn default() -> Self {
        Self {
            name: "Type II".to_string(),
            initial_hc: 1.25,
            hc_vre: VRE_2,
            emean: 2.16e5,
            asphaltene_diffusion_energy: None,
            resin_diffusion_energy: None,
            c15_aro_diffusion_energy: None,
            c15_sat_diffusion_energy: None,
        }
    }
}

impl SourceRockType {
    fn diffusion_energy_overrides(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("asphaltenes", self.asphaltene_diffusion_energy),
            ("resins", self.resin_diffusion_energy),
            ("C15+Aro", self.c15_aro_diffusion_energy),
            ("C15+Sat", self.c15_sat_diffusion_energy),
        ]
    }
}

/// Drives one node at a time through initialization and time steps.
///
/// The chemical model is shared read-only, so one simulator serves every
/// node of a grid, including from several threads.
#[derive(Debug, Clone)]
pub struct Simulator {
    model: Arc<ChemicalModel>,
    properties: SimulatorProperties,
    source_rock_type: SourceRockType,
    adsorption: Option<AdsorptionSimulator>,
}

impl Simulator {
    pub fn new(model: Arc<ChemicalModel>, properties: SimulatorProperties, source_rock_type: SourceRockType) -> Self {
        Self {
            model,
            properties,
            source_rock_type,
            adsorption: None,
        }
    }

    /// Builds and preprocesses the chemical model for a source-rock type.
    pub fn from_config(config: &GenexConfig, source_rock_type: &SourceRockType) -> Result<Self> {
        let properties = config.simulator_properties()?;
        let params = config.general_parameters(properties.use_default_general_parameters)?;
        let mut model = config.build_chemical_model(params)?;

        if properties.preprocess_species_composition {
            let hc = Self::check_initial_hc(model.params(), source_rock_type.hc_vre, source_rock_type.initial_hc);
            info!(
                "{}: initial H/C {:.4} at VRe {:.2} corrected to {:.4}",
                source_rock_type.name, source_rock_type.initial_hc, source_rock_type.hc_vre, hc
            );
            model.update_species_composition_by_element_name(PREASPHALT, HYDROGEN, hc)?;
            model.comp_early_species()?;
        }
        if properties.preprocess_species_kinetics {
            model.kinetics_early_species(source_rock_type.emean)?;
        }
        for (species, energy) in source_rock_type.diffusion_energy_overrides() {
            if let Some(energy) = energy {
                model.update_species_diffusion_energy1(species, energy)?;
            }
        }

        model.update_species_properties();
        model.compute_factors()?;
        model.validate()?;
        debug!(
            "{}: chemical model ready with {} species and {} reactions",
            source_rock_type.name,
            model.number_of_species(),
            model.reactions().len()
        );

        Ok(Self::new(Arc::new(model), properties, source_rock_type.clone()))
    }

    pub fn with_adsorption(mut self, adsorption: AdsorptionSimulator) -> Self {
        self.adsorption = Some(adsorption);
        self
    }

    pub fn set_adsorption_simulator(&mut self, adsorption: Option<AdsorptionSimulator>) {
        self.adsorption = adsorption;
    }

    pub fn adsorption_simulator(&self) -> Option<&AdsorptionSimulator> {
        self.adsorption.as_ref()
    }

    pub fn model(&self) -> &ChemicalModel {
        &self.model
    }

    pub fn shared_model(&self) -> Arc<ChemicalModel> {
        Arc::clone(&self.model)
    }

    pub fn properties(&self) -> &SimulatorProperties {
        &self.properties
    }

    pub fn source_rock_type(&self) -> &SourceRockType {
        &self.source_rock_type
    }

    /// Step size used to sub-divide a node's history, Ma.
    pub fn maximum_time_step_size(&self, deposition_time: f64) -> f64 {
        let ceiling = self.properties.maximum_time_step_size;
        if self.properties.number_of_timesteps == 0 {
            return ceiling;
        }
        (deposition_time.abs() / self.properties.number_of_timesteps as f64).min(ceiling)
    }

    /// Maps an H/C measured at `vre` to its value at VRe 0.5.
    ///
    /// The three anchor polynomials give H/C at VRe 0.2, 0.8 and 1.0; between
    /// anchors the correction is interpolated linearly. Outside [0.2, 1.0] the
    /// value is returned unchanged.
    pub fn transform_hc(vre: f64, hc: f64) -> f64 {
        let at_vre_1 = || 1.0 / ((((0.742501 * hc - 4.001215) * hc + 8.543431) * hc - 9.053234) * hc + 4.791546);
        let at_vre_3 = || 1.0 / ((((-1.309574 * hc + 3.845736) * hc - 2.428247) * hc - 2.455886) * hc + 3.318530);
        let at_vre_4 = || 1.0 / ((((7.717693 * hc - 32.765333) * hc + 51.647141) * hc - 36.926169) * hc + 11.273280);
        let lerp = |v0: f64, h0: f64, v1: f64, h1: f64| h0 + (vre - v0) * (h1 - h0) / (v1 - v0);

        if vre < VRE_1 || vre > VRE_4 {
            hc
        } else if vre < VRE_2 {
            lerp(VRE_1, at_vre_1(), VRE_2, hc)
        } else if vre < VRE_3 {
            lerp(VRE_2, hc, VRE_3, at_vre_3())
        } else {
            lerp(VRE_3, at_vre_3(), VRE_4, at_vre_4())
        }
    }

    /// Initial preasphaltene H/C, corrected to VRe 0.5 and clamped to [HCmin, HCmax].
    pub fn check_initial_hc(params: &GeneralParameters, vre: f64, hc: f64) -> f64 {
        let corrected = if (vre - VRE_2).abs() < f64::EPSILON {
            hc
        } else {
            Self::transform_hc(vre, hc)
        };
        if corrected.is_finite() {
            corrected.clamp(params.hc_min, params.hc_max)
        } else {
            hc.clamp(params.hc_min, params.hc_max)
        }
    }

    /// Organic matter per unit rock volume (kg/m³) for a TOC (wt%) and inorganic density (kg/m³).
    pub fn compute_node_initial_organic_matter_density(&self, toc: f64, inorganic_density: f64) -> Result<f64> {
        let carbon_weight = self
            .model
            .element_by_name(CARBON)
            .map(|e| e.atomic_weight)
            .ok_or_else(|| GenexError::InvalidInput("carbon is not an element of the chemical model".to_string()))?;
        let preasphalt = self
            .model
            .species_by_name(PREASPHALT)
            .ok_or_else(|| GenexError::MissingSpecies(PREASPHALT.to_string()))?;
        let props = preasphalt.properties();

        let organic_mass_fraction = props.mol_weight * toc / (carbon_weight * 100.0);
        if organic_mass_fraction <= 0.0 || inorganic_density <= 0.0 {
            return Err(GenexError::InvalidInput(format!(
                "cannot derive organic matter density from TOC {} and inorganic density {}",
                toc, inorganic_density
            )));
        }
        let inorganic_over_organic_volume = props.density / inorganic_density * (1.0 / organic_mass_fraction - 1.0);
        Ok(props.density / (inorganic_over_organic_volume + 1.0))
    }

    /// Seeds a node's state from its first input.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize_source_rock_node(
        &self,
        input: &SourceRockNodeInput,
        slot: &mut Option<SimulatorState>,
        thickness: f64,
        toc: f64,
        inorganic_density: f64,
        mean_bulk_density: f64,
    ) -> Result<SourceRockNodeOutput> {
        if slot.is_some() {
            return Err(SequencingError::AlreadyInitialized { i: input.i, j: input.j }.into());
        }
        if thickness.is_nan() || thickness < 0.0 {
            return Err(GenexError::InvalidInput(format!("negative thickness {}", thickness)));
        }

        let conc_ki = self.compute_node_initial_organic_matter_density(toc, inorganic_density)?;
        let mut state = SimulatorState::new(&self.model, input.current_time);
        state.conc_ki = conc_ki;
        state.initial_toc = toc;
        state.current_toc = toc;
        state.inorganic_density = inorganic_density;
        state.mean_bulk_density = mean_bulk_density;
        state.thickness = thickness;

        let mut output = SourceRockNodeOutput::new(input.current_time);
        self.model.compute_first_time_instance(&mut state, &mut output, thickness)?;
        output.toc = self.compute_toc(input, &mut state);

        *slot = Some(state);
        Ok(output)
    }

    /// Step-invariant conditions for advancing `state` to `input` over `dt`.
    pub fn step_conditions(&self, state: &SimulatorState, input: &SourceRockNodeInput, dt: f64) -> StepConditions {
        let params = self.model.params();
        let temperature_k = input.temperature_k();
        let waso = state.waso();
        let kerogen_transformation_ratio =
            (1.0 - (state.species_concentration(KEROGEN) + state.species_concentration(PREASPHALT))).max(0.0);

        StepConditions {
            time_step_size: dt,
            effective_pressure: input.pressure,
            temperature_k,
            frequency_factor: BOLTZMANN_OVER_PLANCK_PER_K_MA * temperature_k,
            kerogen_transformation_ratio,
            diffusion_conc_dependence: state.wbo() * (1.0 - waso).powi(2) + params.wbo_min,
            vogel_fulcher_temperature: (1.0 - waso) * (params.t0_torbanite + params.tuning_const)
                + waso * params.t0_aromatic,
            open_conditions: self.properties.simulate_open_conditions,
        }
    }

    /// Advances an initialized node to `input.current_time`.
    pub fn compute_source_rock_node_time_instance(
        &self,
        input: &SourceRockNodeInput,
        slot: &mut Option<SimulatorState>,
        thickness: f64,
    ) -> Result<SourceRockNodeOutput> {
        let state = slot.as_mut().ok_or(SequencingError::NotInitialized)?;
        if state.species_states().len() != self.model.number_of_species() {
            return Err(GenexError::InvalidInput(format!(
                "state holds {} species, chemical model has {}",
                state.species_states().len(),
                self.model.number_of_species()
            )));
        }
        let dt = state.check_step(input.previous_time, input.current_time)?;
        let conditions = self.step_conditions(state, input, dt);
        let immobiles_before = self.immobile_concentrations(state);

        let conc_ki = state.conc_ki;
        state.thickness = thickness;
        let mut output = SourceRockNodeOutput::new(input.current_time);
        self.model
            .compute_time_step(state, &mut output, thickness, conc_ki, &conditions);

        for (id, before) in immobiles_before {
            let after = state.species_concentration(id.as_str());
            state.immobiles.add_retained(id, (after - before) * thickness * conc_ki);
        }

        if let Some(adsorption) = &self.adsorption {
            adsorption.compute(thickness, input, &mut output, state);
        }

        state.commit_step(input.current_time);
        output.toc = self.compute_toc(input, state);
        Ok(output)
    }

    fn immobile_concentrations(&self, state: &SimulatorState) -> Vec<(ImmobileSpeciesId, f64)> {
        ImmobileSpeciesId::ALL
            .iter()
            .filter(|id| self.model.species_by_name(id.as_str()).is_some())
            .map(|id| (*id, state.species_concentration(id.as_str())))
            .collect()
    }

    /// Current TOC (wt%): initial below VRe 0.5, carbon-content tracked and rescaled above it.
    fn compute_toc(&self, input: &SourceRockNodeInput, state: &mut SimulatorState) -> f64 {
        let toc = if input.vre < VRE_TOC_THRESHOLD {
            state.initial_toc
        } else {
            let carbon = self.model.carbon_content(state);
            let reference = state.capture_toc_at_vre05(carbon);
            if reference > 0.0 {
                carbon * state.initial_toc / reference
            } else {
                state.initial_toc
            }
        };
        state.current_toc = toc;
        toc
    }

    /// Relative difference (%) between the initial organic mass and what is
    /// now retained, waiting to be generated, or expelled.
    pub fn mass_balance_percent(&self, state: &SimulatorState, thickness: f64) -> f64 {
        let initial = state.initial_kerogen_concentration * state.conc_ki;
        if initial <= 0.0 {
            return 0.0;
        }
        let in_rock: f64 = state
            .species_states()
            .iter()
            .map(|s| s.concentration + s.pending_generated_mass)
            .sum();
        let expelled: f64 = state.species_states().iter().map(|s| s.expelled_mass).sum();
        let current = in_rock * thickness * state.conc_ki + expelled;
        (current - initial).abs() / initial * 100.0
    }
}
