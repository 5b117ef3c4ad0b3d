use crate::component::ComponentId;
use crate::constants::*;
use crate::element::{CARBON, Element, HYDROGEN, NITROGEN, OXYGEN};
use crate::error::{ConfigError, GenexError};
use crate::general_parameters::GeneralParameters;
use crate::node_output::{GroupResult, SourceRockNodeOutput, SpeciesResult};
use crate::reaction::Reaction;
use crate::simulator_state::SimulatorState;
use crate::species::{Species, StepConditions};
use log::debug;

/// Per-step expulsion totals that are not stored in the state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepTotals {
    pub exm_tot: f64,
    pub oil_expelled_mass: f64,
    pub oil_expelled_volume: f64,
    pub hc_gas_expelled_volume: f64,
    pub wet_gas_expelled_volume: f64,
    pub c614_sat_plus_arom_volume: f64,
    pub aromatics_volume: f64,
    pub saturates_volume: f64,
}

/// The kerogen cracking network: elements, species, reactions and the
/// empirical parameters they were derived with.
///
/// Built once, then shared read-only between all nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalModel {
    params: GeneralParameters,
    elements: Vec<Element>,
    species: Vec<Species>,
    reactions: Vec<Reaction>,
    daughters: Vec<Vec<(usize, f64)>>,
}

impl ChemicalModel {
    pub fn new(params: GeneralParameters) -> Self {
        Self {
            params,
            elements: Vec::new(),
            species: Vec::new(),
            reactions: Vec::new(),
            daughters: Vec::new(),
        }
    }

    pub fn params(&self) -> &GeneralParameters {
        &self.params
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Species sorted by id.
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn number_of_species(&self) -> usize {
        self.species.len()
    }

    pub fn add_element(&mut self, element: Element) -> Result<(), ConfigError> {
        if self.element_by_name(&element.name).is_some() {
            return Err(ConfigError::DuplicateElement(element.name));
        }
        self.elements.push(element);
        Ok(())
    }

    pub fn element_by_name(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn add_species(&mut self, species: Species) -> Result<(), ConfigError> {
        if self.species.iter().any(|s| s.name() == species.name() || s.id() == species.id()) {
            return Err(ConfigError::DuplicateSpecies(species.name().to_string()));
        }
        let position = self.species.partition_point(|s| s.id() < species.id());
        self.species.insert(position, species);
        self.daughters.clear();
        Ok(())
    }

    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species.iter().position(|s| s.name() == name)
    }

    pub fn species_by_name(&self, name: &str) -> Option<&Species> {
        self.species.iter().find(|s| s.name() == name)
    }

    pub fn species_mut(&mut self, name: &str) -> Result<&mut Species, ConfigError> {
        self.species
            .iter_mut()
            .find(|s| s.name() == name)
            .ok_or_else(|| ConfigError::UnknownSpecies {
                species: name.to_string(),
                context: "chemical model".to_string(),
            })
    }

    pub fn update_species_composition_by_element_name(
        &mut self,
        species: &str,
        element: &str,
        value: f64,
    ) -> Result<(), ConfigError> {
        if self.element_by_name(element).is_none() {
            return Err(ConfigError::UnknownElement {
                element: element.to_string(),
                context: format!("composition of {}", species),
            });
        }
        self.species_mut(species)?.set_composition(element, value);
        Ok(())
    }

    pub fn update_species_diffusion_energy1(&mut self, species: &str, value: f64) -> Result<(), ConfigError> {
        self.species_mut(species)?.properties_mut().diffusion_energy_1 = value;
        Ok(())
    }

    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<(), ConfigError> {
        if self.reactions.iter().any(|r| r.mother() == reaction.mother()) {
            return Err(ConfigError::DuplicateReaction {
                mother: reaction.mother().to_string(),
            });
        }
        for name in std::iter::once(reaction.mother()).chain(reaction.products().iter().map(String::as_str)) {
            if self.species_by_name(name).is_none() {
                return Err(ConfigError::UnknownSpecies {
                    species: name.to_string(),
                    context: format!("reaction of {}", reaction.mother()),
                });
            }
        }
        self.species_mut(reaction.mother())?.properties_mut().reactive = true;
        self.reactions.push(reaction);
        Ok(())
    }

    pub fn reaction_mut(&mut self, mother: &str) -> Option<&mut Reaction> {
        self.reactions.iter_mut().find(|r| r.mother() == mother)
    }

    fn set_composition_if_present(&mut self, species: &str, element: &str, value: f64) {
        if let Some(s) = self.species.iter_mut().find(|s| s.name() == species) {
            s.set_composition(element, value);
        }
    }

    /// Derives the compositions of the early species from preasphaltene H/C.
    pub fn comp_early_species(&mut self) -> Result<(), ConfigError> {
        let p = self.params.clone();
        let hp = self.species_mut(PREASPHALT)?.composition(HYDROGEN);
        let op = p.oc_preasphalt_1 * hp * hp + p.oc_preasphalt_2 * hp + p.oc_preasphalt_3;
        self.set_composition_if_present(PREASPHALT, OXYGEN, op);

        let kerogen_h = p.hc_kerogen_1 * hp + p.hc_kerogen_2;
        let kerogen_o = p.oc_kerogen_1 * op + p.oc_kerogen_2;
        let kerogen_n = kerogen_o * p.n_kerogen;
        self.set_composition_if_present(KEROGEN, HYDROGEN, kerogen_h);
        self.set_composition_if_present(KEROGEN, OXYGEN, kerogen_o);
        self.set_composition_if_present(KEROGEN, NITROGEN, kerogen_n);

        let preasphalt_n = kerogen_n * p.n_preasphalt;
        self.set_composition_if_present(PREASPHALT, NITROGEN, preasphalt_n);

        let asphaltene_h = p.hc_asph_over_preasphalt * hp;
        let asphaltene_o = (p.oc_asph_over_preasphalt * op).max(p.oc_asph_min);
        let asphaltene_n = preasphalt_n * p.n_asphaltene;
        let asphaltenes = ComponentId::Asphaltenes.as_str();
        self.set_composition_if_present(asphaltenes, HYDROGEN, asphaltene_h);
        self.set_composition_if_present(asphaltenes, OXYGEN, asphaltene_o);
        self.set_composition_if_present(asphaltenes, NITROGEN, asphaltene_n);

        let resin_n = asphaltene_n * p.n_resin;
        let resins = ComponentId::Resins.as_str();
        self.set_composition_if_present(resins, HYDROGEN, asphaltene_h);
        self.set_composition_if_present(resins, OXYGEN, asphaltene_o);
        self.set_composition_if_present(resins, NITROGEN, resin_n);

        let precoke_o = p.oc_precoke_when_hc_preasphalt_zero - p.oc_precoke_per_preasphalt * hp;
        let precoke_n = resin_n * p.n_precoke;
        self.set_composition_if_present("precoke", OXYGEN, precoke_o);
        self.set_composition_if_present("precoke", NITROGEN, precoke_n);
        self.set_composition_if_present("coke1", OXYGEN, precoke_o);

        self.set_composition_if_present("Hetero1", NITROGEN, precoke_n * p.n_hetero1);
        self.set_composition_if_present("Hetero2", NITROGEN, p.n_hetero2);
        self.set_composition_if_present(ComponentId::C15PlusAro.as_str(), NITROGEN, p.n_c15_plus_aro);

        debug!("early species compositions derived from preasphaltene H/C {:.4}", hp);
        Ok(())
    }

    /// Derives the activation energies and orders of the early species from Emean (J/mol).
    pub fn kinetics_early_species(&mut self, emean: f64) -> Result<(), ConfigError> {
        let p = self.params.clone();
        let easph1 = 2.0 * emean - p.e_cracking_cc;

        self.species_mut(KEROGEN)?.properties_mut().reaction_order = KEROGEN_ORDER;

        let preasphalt = self.species_mut(PREASPHALT)?;
        let order = preasphalt.compute_reaction_order(&p);
        let props = preasphalt.properties_mut();
        props.activation_energy_1 = easph1 - p.e_diff_1 - p.e_drop_for_s;
        props.activation_energy_2 = p.e_cracking_cc - p.e_diff_2;
        props.reaction_order = order;

        for name in [ComponentId::Asphaltenes.as_str(), ComponentId::Resins.as_str()] {
            if let Ok(species) = self.species_mut(name) {
                let props = species.properties_mut();
                props.activation_energy_1 = easph1;
                props.activation_energy_2 = p.e_cracking_cc;
            }
        }
        Ok(())
    }

    pub fn update_species_properties(&mut self) {
        let elements = &self.elements;
        let params = &self.params;
        for species in self.species.iter_mut() {
            species.update_properties(elements, params);
        }
    }

    pub fn preasphaltene_aromaticity(&self) -> f64 {
        self.species_by_name(PREASPHALT)
            .map(|s| s.compute_aromaticity(&self.params))
            .unwrap_or(0.0)
    }

    /// Solves every reaction's mass factors and links mothers to daughters.
    pub fn compute_factors(&mut self) -> Result<(), ConfigError> {
        let aromaticity = self.preasphaltene_aromaticity();
        let mut solved = Vec::with_capacity(self.reactions.len());
        for reaction in &self.reactions {
            let factors = reaction.compute_mass_factors(&self.species, &self.elements, aromaticity)?;
            solved.push((reaction.mother().to_string(), factors));
        }
        for (mother, factors) in solved {
            self.species_mut(&mother)?.set_mass_factors(factors);
        }
        self.link_daughters();
        Ok(())
    }

    fn link_daughters(&mut self) {
        self.daughters = self
            .species
            .iter()
            .map(|mother| {
                mother
                    .mass_factors()
                    .iter()
                    .filter_map(|(product, factor)| self.species_index(product).map(|i| (i, *factor)))
                    .collect()
            })
            .collect();
    }

    /// Checks the network is complete enough to drive expulsion.
    pub fn validate(&self) -> Result<(), GenexError> {
        for name in [KEROGEN, PREASPHALT] {
            if self.species_by_name(name).is_none() {
                return Err(GenexError::MissingSpecies(name.to_string()));
            }
        }
        for id in ComponentId::ALL.iter().filter(|c| c.is_required()) {
            if self.species_by_name(id.as_str()).is_none() {
                return Err(GenexError::MissingSpecies(id.as_str().to_string()));
            }
        }
        for species in &self.species {
            for (product, factor) in species.mass_factors() {
                if *factor <= 0.0 {
                    return Err(ConfigError::NonPositiveMassFactor {
                        mother: species.name().to_string(),
                        product: product.clone(),
                        factor: *factor,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Sets up the kerogen-only initial state and its output.
    pub fn compute_first_time_instance(
        &self,
        state: &mut SimulatorState,
        output: &mut SourceRockNodeOutput,
        thickness: f64,
    ) -> Result<(), GenexError> {
        let kerogen_index = self
            .species_index(KEROGEN)
            .ok_or_else(|| GenexError::MissingSpecies(KEROGEN.to_string()))?;
        let kerogen = &self.species[kerogen_index];
        let factor = kerogen.mass_factor(PREASPHALT);
        if factor <= 0.0 {
            return Err(ConfigError::NonPositiveMassFactor {
                mother: KEROGEN.to_string(),
                product: PREASPHALT.to_string(),
                factor,
            }
            .into());
        }

        let kerogen_concentration = 1.0 / factor;
        state.initial_kerogen_concentration = kerogen_concentration * thickness;
        state.species_states_mut()[kerogen_index].concentration = kerogen_concentration;

        for species_state in state.species_states() {
            output.add_species_result(SpeciesResult {
                name: species_state.name.clone(),
                concentration: species_state.concentration,
                ..SpeciesResult::default()
            });
        }

        state.set_lumped_to_zero();
        state.update_lumped(
            kerogen_concentration,
            0.0,
            kerogen.properties().aromaticity * kerogen_concentration,
        );
        self.post_process_time_step_computation(state, output, thickness, &StepTotals::default());
        Ok(())
    }

    /// Advances every species over one open-system step and fills `output`.
    pub fn compute_time_step(
        &self,
        state: &mut SimulatorState,
        output: &mut SourceRockNodeOutput,
        thickness: f64,
        conc_ki: f64,
        conditions: &StepConditions,
    ) -> StepTotals {
        let dt = conditions.time_step_size;
        let coke2 = state.species_concentration(COKE2);
        let mut next_generated = vec![0.0; self.species.len()];
        let mut totals = StepTotals::default();
        let (mut total, mut mobile, mut aromatic) = (0.0, 0.0, 0.0);

        for (index, species) in self.species.iter().enumerate() {
            let species_state = &mut state.species_states_mut()[index];
            let generation_rate = if dt > 0.0 {
                species_state.pending_generated_mass / dt
            } else {
                0.0
            };
            let result = species.compute_time_step(
                species_state.concentration,
                generation_rate,
                coke2,
                thickness,
                conc_ki,
                conditions,
                &self.params,
            );

            if let Some(daughters) = self.daughters.get(index) {
                for &(daughter, factor) in daughters {
                    next_generated[daughter] += factor * result.negative_generation_rate.abs() * dt;
                }
            }

            species_state.concentration = result.concentration;
            species_state.expel(result.mass_expelled_inst);
            let expelled_cum = species_state.expelled_mass;
            let generated_cum = result.concentration * thickness * conc_ki + expelled_cum;

            let c = result.concentration;
            total += c;
            let props = species.properties();
            if props.oil {
                mobile += c;
            }
            aromatic += match species.name() {
                KEROGEN => c * props.aromaticity,
                PREASPHALT => 0.0,
                _ => c,
            };

            output.add_species_result(SpeciesResult {
                name: species.name().to_string(),
                concentration: c,
                cracking_rate: result.negative_generation_rate,
                generated_rate: result.generated_rate,
                generated_cum,
                expelled_rate: result.flux,
                expelled_cum,
                ..SpeciesResult::default()
            });

            totals.exm_tot += expelled_cum;
            if let Some(component) = species.component() {
                let group = GroupResult {
                    generated_cum,
                    generated_rate: result.generated_rate,
                    expelled_cum,
                    expelled_rate: result.flux,
                };
                if component.is_oil() {
                    output.groups.oil.accumulate(&group);
                    totals.oil_expelled_mass += result.mass_expelled_inst;
                    totals.oil_expelled_volume += result.volume_expelled_inst;
                }
                if component.is_hc_gas() {
                    output.groups.hc_gas.accumulate(&group);
                    totals.hc_gas_expelled_volume += result.volume_expelled_inst;
                }
                if component.is_wet_gas() {
                    output.groups.wet_gas.accumulate(&group);
                    totals.wet_gas_expelled_volume += result.volume_expelled_inst;
                }
                if component.is_dry_gas() {
                    output.groups.dry_gas.accumulate(&group);
                }
                if component.is_c6_14() {
                    totals.c614_sat_plus_arom_volume += result.volume_expelled_inst;
                }
                if component.is_aromatic() {
                    totals.aromatics_volume += result.volume_expelled_inst;
                }
                if component.is_saturate() {
                    totals.saturates_volume += result.volume_expelled_inst;
                }
            }
        }

        for (species_state, generated) in state.species_states_mut().iter_mut().zip(next_generated) {
            species_state.pending_generated_mass = generated;
        }
        state.set_lumped_to_zero();
        state.update_lumped(total, mobile, aromatic);
        self.post_process_time_step_computation(state, output, thickness, &totals);
        totals
    }

    /// Advances concentrations in a closed system (no expulsion), as used for
    /// secondary cracking. Pending generation is carried in `pending`.
    pub fn advance_closed_system(
        &self,
        concentrations: &mut [f64],
        pending: &mut [f64],
        conditions: &StepConditions,
    ) -> Result<(), GenexError> {
        let n = self.species.len();
        if concentrations.len() != n || pending.len() != n {
            return Err(GenexError::InvalidInput(format!(
                "closed-system step needs {} species values, got {} concentrations and {} pending",
                n,
                concentrations.len(),
                pending.len()
            )));
        }
        let dt = conditions.time_step_size;
        let coke2 = self
            .species_index(COKE2)
            .and_then(|i| concentrations.get(i).copied())
            .unwrap_or(0.0);
        let mut next_generated = vec![0.0; self.species.len()];

        for (index, species) in self.species.iter().enumerate() {
            let generation_rate = if dt > 0.0 { pending[index] / dt } else { 0.0 };
            let c = concentrations[index];
            if species.is_reactive() {
                let k = species.arrhenius_reaction_rate(conditions, coke2, &self.params);
                let order = if c < 0.0 { 1.0 } else { species.properties().reaction_order };
                let order_factor = if c > 0.0 { c.powf(order - 1.0) } else if order > 1.0 { 0.0 } else { 1.0 };
                let updated = (c + generation_rate * dt) / (1.0 + k * order_factor * dt);
                let cracked = k * updated.max(0.0).powf(order);
                for &(daughter, factor) in self.daughters.get(index).into_iter().flatten() {
                    next_generated[daughter] += factor * cracked * dt;
                }
                concentrations[index] = updated;
            } else {
                concentrations[index] = c + generation_rate * dt;
            }
        }
        pending.copy_from_slice(&next_generated);
        Ok(())
    }

    /// Cumulative volumes and derived fluid-quality ratios of a step.
    pub fn post_process_time_step_computation(
        &self,
        state: &mut SimulatorState,
        output: &mut SourceRockNodeOutput,
        thickness: f64,
        totals: &StepTotals,
    ) {
        let cum = &mut state.cumulative;
        cum.oil_mass += totals.oil_expelled_mass;
        cum.oil_volume += totals.oil_expelled_volume;
        cum.hc_gas_volume += totals.hc_gas_expelled_volume;
        cum.wet_gas_volume += totals.wet_gas_expelled_volume;
        cum.c614_sat_plus_arom_volume += totals.c614_sat_plus_arom_volume;
        cum.aromatics_volume += totals.aromatics_volume;
        cum.saturates_volume += totals.saturates_volume;
        let cum = *cum;

        output.api_inst = compute_api(totals.oil_expelled_mass, totals.oil_expelled_volume);
        output.api_cum = compute_api(cum.oil_mass, cum.oil_volume);

        output.gor_inst = compute_gor(totals.hc_gas_expelled_volume, totals.oil_expelled_volume, FLUX_OIL_VOLUME_ZERO);
        output.gor_cum = compute_gor(cum.hc_gas_volume, cum.oil_volume, CUM_OIL_VOLUME_ZERO);
        output.cgr_inst = compute_cgr(output.gor_inst);
        output.cgr_cum = compute_cgr(output.gor_cum);

        output.gas_wetness_inst = compute_ratio(
            totals.wet_gas_expelled_volume,
            totals.hc_gas_expelled_volume,
            UNDEFINED_VALUE,
        );
        output.gas_wetness_cum = compute_ratio(cum.wet_gas_volume, cum.hc_gas_volume, UNDEFINED_VALUE);
        output.aromaticity_inst = compute_ratio(totals.aromatics_volume, totals.saturates_volume, 0.0);
        output.aromaticity_cum = compute_ratio(cum.aromatics_volume, cum.saturates_volume, 0.0);

        output.kerogen_conversion_ratio = if thickness > KEROGEN_CONVERSION_MIN_THICKNESS_M
            && state.initial_kerogen_concentration > 0.0
        {
            let remaining = state.species_concentration(PREASPHALT) + state.species_concentration(KEROGEN);
            let ratio = 1.0 - remaining * thickness / state.initial_kerogen_concentration;
            if ratio < KEROGEN_CONVERSION_ZERO { 0.0 } else { ratio.min(1.0) }
        } else {
            UNDEFINED_VALUE
        };

        output.exm_tot = totals.exm_tot;
        output.total_retained_om = state.lumped.total * thickness * state.conc_ki;
        output.mobile_om_conc = state.lumped.mobile;
    }

    /// TOC (wt%) implied by the carbon still held in the species.
    pub fn carbon_content(&self, state: &SimulatorState) -> f64 {
        self.species
            .iter()
            .zip(state.species_states())
            .filter(|(species, _)| species.has_carbon())
            .map(|(species, s)| {
                let mol_weight = species.properties().mol_weight;
                if mol_weight > 0.0 {
                    s.concentration * species.composition(CARBON) / mol_weight
                } else {
                    0.0
                }
            })
            .sum()
    }
}

fn compute_api(mass: f64, volume: f64) -> f64 {
    if volume > FLUX_OIL_VOLUME_ZERO {
        let density = mass / volume;
        API_C1 / density * API_C2 - API_C3
    } else {
        API_DEFAULT
    }
}

fn compute_gor(gas_volume: f64, oil_volume: f64, zero: f64) -> f64 {
    if oil_volume > zero {
        (gas_volume / oil_volume).min(GOR_UPPER_BOUND)
    } else {
        UNDEFINED_VALUE
    }
}

fn compute_cgr(gor: f64) -> f64 {
    if gor > CGR_GOR_THRESHOLD { 1.0 / gor } else { 0.0 }
}

fn compute_ratio(numerator: f64, denominator: f64, undefined: f64) -> f64 {
    if denominator > CUM_OIL_VOLUME_ZERO {
        numerator / denominator
    } else {
        undefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratio_expression::RatioExpression;
    use crate::reaction::ReactionRatio;
    use approx::assert_relative_eq;
    use more_asserts::{assert_ge, assert_gt};

    fn kerogen_model() -> ChemicalModel {
        let mut model = ChemicalModel::new(GeneralParameters::default());
        model.add_element(Element::new("C", 12.011)).unwrap();
        model.add_element(Element::new("H", 1.008)).unwrap();
        model.add_species(Species::new("kerogen", 1)).unwrap();
        model.add_species(Species::new("preasphalt", 2)).unwrap();
        model.add_species(Species::new("C1", 3)).unwrap();
        model.update_species_composition_by_element_name("kerogen", "C", 1.0).unwrap();
        model.update_species_composition_by_element_name("kerogen", "H", 1.2).unwrap();
        model.update_species_composition_by_element_name("preasphalt", "C", 1.0).unwrap();
        model.update_species_composition_by_element_name("preasphalt", "H", 1.0).unwrap();
        model.update_species_composition_by_element_name("C1", "C", 1.0).unwrap();
        model.update_species_composition_by_element_name("C1", "H", 4.0).unwrap();

        let mut reaction = Reaction::new("kerogen", vec!["preasphalt".to_string(), "C1".to_string()]);
        reaction
            .add_ratio(ReactionRatio {
                product_1: "preasphalt".to_string(),
                product_2: "C1".to_string(),
                expression: RatioExpression::parse("9").unwrap(),
            })
            .unwrap();
        model.add_reaction(reaction).unwrap();
        model.update_species_properties();
        model.compute_factors().unwrap();
        model
    }

    #[test]
    fn test_species_are_kept_in_id_order() {
        let mut model = ChemicalModel::new(GeneralParameters::default());
        model.add_species(Species::new("C1", 13)).unwrap();
        model.add_species(Species::new("kerogen", 1)).unwrap();
        assert_eq!(model.species()[0].name(), "kerogen");
        assert!(model.add_species(Species::new("C1", 20)).is_err());
        assert!(model.add_species(Species::new("C2", 1)).is_err());
    }

    #[test]
    fn test_reaction_requires_known_species() {
        let mut model = ChemicalModel::new(GeneralParameters::default());
        model.add_species(Species::new("kerogen", 1)).unwrap();
        let err = model
            .add_reaction(Reaction::new("kerogen", vec!["preasphalt".to_string()]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSpecies { .. }));
    }

    #[test]
    fn test_first_time_instance_holds_only_kerogen() {
        let model = kerogen_model();
        let mut state = SimulatorState::new(&model, 100.0);
        let mut output = SourceRockNodeOutput::new(100.0);
        model.compute_first_time_instance(&mut state, &mut output, 10.0).unwrap();

        // kerogen concentration is 1 / mass factor of preasphalt (0.9)
        assert_relative_eq!(state.species_concentration("kerogen"), 1.0 / 0.9, epsilon = 1e-12);
        assert_relative_eq!(state.initial_kerogen_concentration, 10.0 / 0.9, epsilon = 1e-12);
        assert_eq!(state.species_concentration("C1"), 0.0);
        assert_eq!(output.kerogen_conversion_ratio, 0.0);
        assert_eq!(output.gor_cum, UNDEFINED_VALUE);
        assert_eq!(output.api_cum, API_DEFAULT);
    }

    #[test]
    fn test_generation_feeds_daughters_next_step() {
        let model = kerogen_model();
        let mut state = SimulatorState::new(&model, 100.0);
        let mut output = SourceRockNodeOutput::new(100.0);
        model.compute_first_time_instance(&mut state, &mut output, 1.0).unwrap();

        let temperature_k = 150.0 + TO_KELVIN;
        let mut conditions = StepConditions {
            time_step_size: 1.0,
            temperature_k,
            frequency_factor: BOLTZMANN_OVER_PLANCK_PER_K_MA * temperature_k,
            ..StepConditions::default()
        };
        let kerogen = model.species_by_name("kerogen").unwrap();
        let mut props = kerogen.properties().clone();
        props.activation_energy_1 = 2.0e5;
        props.activation_energy_2 = 2.0e5;
        props.reaction_order = 1.0;
        let mut model = model;
        *model.species_mut("kerogen").unwrap().properties_mut() = props;

        let mut first = SourceRockNodeOutput::new(99.0);
        model.compute_time_step(&mut state, &mut first, 1.0, 1.0, &conditions);
        let cracked = -first.species_result("kerogen").unwrap().cracking_rate;
        assert_gt!(cracked, 0.0);

        // daughters have not been touched yet, but hold the mother's loss as pending mass
        assert_eq!(state.species_concentration("preasphalt"), 0.0);
        let pending: f64 = state.species_states().iter().map(|s| s.pending_generated_mass).sum();
        assert_relative_eq!(pending, cracked, max_relative = 1e-12);

        conditions.time_step_size = 0.5;
        let mut second = SourceRockNodeOutput::new(98.5);
        model.compute_time_step(&mut state, &mut second, 1.0, 1.0, &conditions);
        assert_gt!(state.species_concentration("preasphalt"), 0.0);
        assert_gt!(state.species_concentration("C1"), 0.0);
    }

    #[test]
    fn test_fractional_order_cracking_feeds_preasphalt() {
        let mut model = kerogen_model();
        {
            let props = model.species_mut("kerogen").unwrap().properties_mut();
            props.activation_energy_1 = 2.0e5;
            props.activation_energy_2 = 2.0e5;
            props.reaction_order = 1.5;
        }
        let mut state = SimulatorState::new(&model, 100.0);
        let mut output = SourceRockNodeOutput::new(100.0);
        model.compute_first_time_instance(&mut state, &mut output, 1.0).unwrap();
        let before = state.species_concentration("kerogen");

        let temperature_k = 160.0 + TO_KELVIN;
        let conditions = StepConditions {
            time_step_size: 1.0,
            temperature_k,
            frequency_factor: BOLTZMANN_OVER_PLANCK_PER_K_MA * temperature_k,
            ..StepConditions::default()
        };
        let kerogen = model.species_by_name("kerogen").unwrap();
        let k = kerogen.arrhenius_reaction_rate(&conditions, 0.0, &model.params);
        let factor = kerogen.mass_factor("preasphalt");

        let mut step = SourceRockNodeOutput::new(99.0);
        model.compute_time_step(&mut state, &mut step, 1.0, 1.0, &conditions);

        let after = before / (1.0 + k * before.sqrt());
        assert_relative_eq!(state.species_concentration("kerogen"), after, max_relative = 1e-12);
        let rate = step.species_result("kerogen").unwrap().cracking_rate;
        assert_relative_eq!(rate, -k * after.powf(1.5), max_relative = 1e-12);

        let preasphalt = state.species_state("preasphalt").unwrap();
        assert_relative_eq!(preasphalt.pending_generated_mass, factor * rate.abs(), max_relative = 1e-12);
        for species in state.species_states() {
            assert_ge!(species.concentration, 0.0);
        }
    }

    #[test]
    fn test_closed_system_conserves_mass_after_flush() {
        let model = kerogen_model();
        let temperature_k = 180.0 + TO_KELVIN;
        let conditions = StepConditions {
            time_step_size: 0.1,
            temperature_k,
            frequency_factor: BOLTZMANN_OVER_PLANCK_PER_K_MA * temperature_k,
            kerogen_transformation_ratio: 1.0,
            ..StepConditions::default()
        };
        let mut model = model;
        {
            let props = model.species_mut("kerogen").unwrap().properties_mut();
            props.activation_energy_1 = 2.1e5;
            props.activation_energy_2 = 2.1e5;
            props.reaction_order = 1.0;
        }

        let mut concentrations = vec![1.0, 0.0, 0.0];
        let mut pending = vec![0.0; 3];
        for _ in 0..10 {
            model.advance_closed_system(&mut concentrations, &mut pending, &conditions).unwrap();
        }
        let total: f64 = concentrations.iter().sum::<f64>() + pending.iter().sum::<f64>();
        assert_relative_eq!(total, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_closed_system_rejects_short_slices() {
        let model = kerogen_model();
        let conditions = StepConditions {
            time_step_size: 0.1,
            ..StepConditions::default()
        };
        let mut concentrations = vec![1.0, 0.0];
        let mut pending = vec![0.0; 3];
        let err = model
            .advance_closed_system(&mut concentrations, &mut pending, &conditions)
            .unwrap_err();
        assert!(matches!(err, GenexError::InvalidInput(_)));
        assert_eq!(concentrations, vec![1.0, 0.0]);
    }

    #[test]
    fn test_fluid_ratios() {
        assert_relative_eq!(compute_api(850.0, 1.0), 141.5 / 850.0 * 1000.0 - 131.5, epsilon = 1e-9);
        assert_eq!(compute_api(1.0, 0.0), API_DEFAULT);
        assert_eq!(compute_gor(1.0, 0.0, CUM_OIL_VOLUME_ZERO), UNDEFINED_VALUE);
        assert_eq!(compute_gor(1.0e30, 1.0, CUM_OIL_VOLUME_ZERO), GOR_UPPER_BOUND);
        assert_eq!(compute_cgr(20000.0), 1.0 / 20000.0);
        assert_eq!(compute_cgr(500.0), 0.0);
    }
}
