use serde::{Deserialize, Serialize};

/// Per-node, per-species evolving quantities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeciesState {
    pub name: String,
    pub concentration: f64,
    /// Mass (concentration units) generated by mothers during the last step, consumed by the next one.
    pub pending_generated_mass: f64,
    pub expelled_mass: f64, // kg/m², cumulative
    pub previous_expelled_mass: f64,
    pub expelled_mass_transient: f64,
    /// Retained mass (kg/m²) tracked by the adsorption/phase split.
    pub retained: f64,
    pub mass_expelled_from_source_rock: f64,
    pub mass_expelled_transient_from_source_rock: f64,
    pub adsorption_capacity: f64, // mol/m³ rock
    pub adsorped_mol: f64,
    pub desorped_mol: f64, // cumulative
    pub free_mol: f64,
    pub expelled_mol: f64, // cumulative
    pub transient_adsorped_mass: f64,
    pub transient_desorped_mass: f64,
}

impl SpeciesState {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Records the expelled mass of a step.
    pub fn expel(&mut self, mass: f64) {
        self.previous_expelled_mass = self.expelled_mass;
        self.expelled_mass += mass;
        self.expelled_mass_transient = mass;
    }

    /// Mass that left the kerogen network since the previous step.
    pub fn expelled_since_previous_step(&self) -> f64 {
        self.expelled_mass - self.previous_expelled_mass
    }

    pub fn expel_from_source_rock(&mut self, mass: f64) {
        self.mass_expelled_from_source_rock += mass;
        self.mass_expelled_transient_from_source_rock = mass;
    }
}
