use crate::component::ComponentId;
use crate::constants::*;
use crate::element::{CARBON, Element, HYDROGEN, OXYGEN};
use crate::general_parameters::GeneralParameters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Physical and kinetic properties of a species, per formula unit normalised to one carbon atom.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeciesProperties {
    pub mol_weight: f64,
    pub density: f64, // kg/m³
    pub activation_energy_1: f64, // J/mol, at zero kerogen transformation
    pub activation_energy_2: f64, // J/mol, at full kerogen transformation
    pub entropy: f64,
    pub volume: f64, // activation volume, m³/mol
    pub reaction_order: f64,
    pub diffusion_energy_1: f64,
    pub diffusion_energy_2: f64,
    pub jump_length: f64,
    pub b0: f64,
    pub aromaticity: f64,
    pub mobile: bool,
    pub reactive: bool,
    pub hc: bool,
    pub oil: bool,
    pub hc_gas: bool,
    pub coking_entropy: bool,
}

/// Thermodynamic and transport conditions shared by every species during one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepConditions {
    pub time_step_size: f64, // Ma
    pub effective_pressure: f64, // Pa
    pub temperature_k: f64,
    pub frequency_factor: f64, // 1/Ma
    pub kerogen_transformation_ratio: f64,
    pub diffusion_conc_dependence: f64,
    pub vogel_fulcher_temperature: f64, // K
    pub open_conditions: bool,
}

/// Result of advancing one species over one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeciesStepResult {
    pub concentration: f64,
    pub negative_generation_rate: f64,
    pub diffusion_leak_rate: f64, // theta
    pub flux: f64, // kg/m²/Ma
    pub generated_rate: f64, // kg/m²/Ma
    pub mass_expelled_inst: f64, // kg/m²
    pub volume_expelled_inst: f64, // m³/m²
}

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    name: String,
    id: usize,
    component: Option<ComponentId>,
    composition: BTreeMap<String, f64>,
    properties: SpeciesProperties,
    mass_factors: Vec<(String, f64)>,
}

impl Species {
    pub fn new(name: &str, id: usize) -> Self {
        let component = ComponentId::from_str(name);
        let properties = SpeciesProperties {
            mobile: !IMMOBILE_SPECIES_NAMES.contains(&name),
            hc: component.is_some_and(|c| c.is_hydrocarbon()),
            oil: component.is_some_and(|c| c.is_oil()),
            hc_gas: component.is_some_and(|c| c.is_hc_gas()),
            coking_entropy: COKING_ENTROPY_SPECIES.contains(&name),
            ..SpeciesProperties::default()
        };
        Self {
            name: name.to_string(),
            id,
            component,
            composition: BTreeMap::new(),
            properties,
            mass_factors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn component(&self) -> Option<ComponentId> {
        self.component
    }

    pub fn properties(&self) -> &SpeciesProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut SpeciesProperties {
        &mut self.properties
    }

    pub fn is_mobile(&self) -> bool {
        self.properties.mobile
    }

    pub fn is_reactive(&self) -> bool {
        self.properties.reactive
    }

    pub fn composition(&self, element: &str) -> f64 {
        self.composition.get(element).copied().unwrap_or(0.0)
    }

    pub fn compositions(&self) -> impl Iterator<Item = (&str, f64)> {
        self.composition.iter().map(|(element, value)| (element.as_str(), *value))
    }

    pub fn set_composition(&mut self, element: &str, value: f64) {
        self.composition.insert(element.to_string(), value);
    }

    /// Product mass factors, in reaction product order.
    pub fn mass_factors(&self) -> &[(String, f64)] {
        &self.mass_factors
    }

    pub fn mass_factor(&self, product: &str) -> f64 {
        self.mass_factors
            .iter()
            .find(|(name, _)| name == product)
            .map(|(_, factor)| *factor)
            .unwrap_or(0.0)
    }

    pub fn set_mass_factors(&mut self, factors: Vec<(String, f64)>) {
        self.properties.reactive = !factors.is_empty();
        self.mass_factors = factors;
    }

    pub fn compute_mol_weight(&self, elements: &[Element]) -> f64 {
        elements
            .iter()
            .map(|element| self.composition(&element.name) * element.atomic_weight)
            .sum()
    }

    /// H/C with oxygen counted towards hydrogen.
    pub fn hc_corrector(&self) -> f64 {
        self.composition(HYDROGEN) + self.composition(OXYGEN) * VAN_KREVELEN_HC_CORRECTOR
    }

    pub fn compute_aromaticity(&self, params: &GeneralParameters) -> f64 {
        if self.properties.mobile && !self.properties.hc {
            return 0.0;
        }
        let a = AROMATICITY_QUADRATIC_A;
        let x = AROMATICITY_QUADRATIC_X;
        let deficit = 2.0 - self.hc_corrector();
        let b = -(x + a * deficit);
        let c = x * deficit - 1.0;
        let discriminant = (b * b - 4.0 * a * c).max(0.0);
        let aromaticity = ((-b - discriminant.sqrt()) / (2.0 * a)).clamp(0.0, 1.0);

        if self.name == PREASPHALT {
            aromaticity.clamp(params.preasphaltene_arom_min, params.preasphaltene_arom_max)
        } else {
            aromaticity
        }
    }

    /// Density (kg/m³) from the group-contribution formula volume.
    pub fn compute_density(&self) -> f64 {
        let h = self.composition(HYDROGEN);
        let o = self.composition(OXYGEN);
        let ring_deficit = (2.0 - self.properties.aromaticity - self.hc_corrector()).max(0.0);
        let rings = ring_deficit / 2.0;
        let vol_ring = VOL_RING_1 + VOL_RING_2 * h;
        let form_vol = FORM_VOL_1 + FORM_VOL_2 * h + FORM_VOL_3 * o - vol_ring * rings;
        if form_vol > 0.0 {
            self.properties.mol_weight / form_vol * 1000.0
        } else {
            0.0
        }
    }

    pub fn compute_b0(&self, params: &GeneralParameters) -> f64 {
        let excess_energy = self.properties.diffusion_energy_1
            - GAS_CONSTANT_J_PER_MOL_K * params.t_lab
            - params.uj;
        let shape = 1.0 - params.t0_torbanite / params.t_lab;
        (excess_energy * shape * shape).max(0.0)
    }

    pub fn compute_reaction_order(&self, params: &GeneralParameters) -> f64 {
        params.order_per_h_over_c * self.composition(HYDROGEN) + params.order_0
    }

    /// Recomputes the correlated properties from the current composition.
    pub fn update_properties(&mut self, elements: &[Element], params: &GeneralParameters) {
        self.properties.mol_weight = self.compute_mol_weight(elements);
        self.properties.aromaticity = self.compute_aromaticity(params);
        self.properties.density = self.compute_density();
        self.properties.b0 = self.compute_b0(params);
    }

    pub fn has_carbon(&self) -> bool {
        self.composition(CARBON) > 0.0
    }

    pub fn arrhenius_reaction_rate(
        &self,
        conditions: &StepConditions,
        coke2_concentration: f64,
        params: &GeneralParameters,
    ) -> f64 {
        let tr = conditions.kerogen_transformation_ratio;
        let activation_energy =
            self.properties.activation_energy_1 * (1.0 - tr) + self.properties.activation_energy_2 * tr;

        let mut entropy = self.properties.entropy;
        if self.properties.coking_entropy {
            entropy += params.ds_per_coke * coke2_concentration;
        }

        let exponent = (-(activation_energy + conditions.effective_pressure * self.properties.volume)
            / conditions.temperature_k
            + entropy)
            / GAS_CONSTANT_J_PER_MOL_K;
        conditions.frequency_factor * exponent.exp()
    }

    /// Jump-diffusion coefficient with a Vogel-Fulcher free-volume term.
    pub fn hybrid4_diffusion(&self, conditions: &StepConditions, params: &GeneralParameters) -> f64 {
        let tk = conditions.temperature_k;
        let t1 = conditions.vogel_fulcher_temperature
            + conditions.effective_pressure * params.beta_over_alpha;
        let jump_squared = self.properties.jump_length * self.properties.jump_length;

        let exponent = if t1 < tk {
            -(params.uj / tk + self.properties.b0 / (tk - t1)) / GAS_CONSTANT_J_PER_MOL_K
        } else {
            -params.uj / (GAS_CONSTANT_J_PER_MOL_K * tk)
        };
        conditions.frequency_factor * jump_squared * exponent.exp()
    }

    /// Expulsion rate constant theta; zero for immobile species or closed conditions.
    pub fn diffusion_leak_rate(&self, conditions: &StepConditions, params: &GeneralParameters) -> f64 {
        if !conditions.open_conditions || !self.properties.mobile {
            return 0.0;
        }
        4.0 * params.biot_over_l2
            * conditions.diffusion_conc_dependence
            * self.hybrid4_diffusion(conditions, params)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn compute_time_step(
        &self,
        concentration: f64,
        generation_rate: f64,
        coke2_concentration: f64,
        thickness: f64,
        conc_ki: f64,
        conditions: &StepConditions,
        params: &GeneralParameters,
    ) -> SpeciesStepResult {
        let dt = conditions.time_step_size;
        let theta = self.diffusion_leak_rate(conditions, params);
        let numerator = concentration + generation_rate * dt;

        let (new_concentration, negative_generation_rate) = if self.properties.reactive {
            let k = self.arrhenius_reaction_rate(conditions, coke2_concentration, params);
            let order = self.properties.reaction_order;
            let order_factor = if concentration > 0.0 {
                concentration.powf(order - 1.0)
            } else if order > 1.0 {
                0.0
            } else {
                1.0
            };
            let c = numerator / (1.0 + (theta + k * order_factor) * dt);
            (c, -k * c.max(0.0).powf(order))
        } else {
            (numerator / (1.0 + theta * dt), 0.0)
        };

        let flux = theta * new_concentration * thickness * conc_ki;
        let mass_expelled_inst = flux * dt;
        let volume_expelled_inst = if self.properties.density > 0.0 {
            mass_expelled_inst / self.properties.density
        } else {
            0.0
        };

        SpeciesStepResult {
            concentration: new_concentration,
            negative_generation_rate,
            diffusion_leak_rate: theta,
            flux,
            generated_rate: generation_rate * thickness * conc_ki,
            mass_expelled_inst,
            volume_expelled_inst,
        }
    }
}
