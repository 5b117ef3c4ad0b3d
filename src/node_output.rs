use serde::{Deserialize, Serialize};

/// Per-species results of one step. Masses in kg/m², rates in kg/m²/Ma.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeciesResult {
    pub name: String,
    pub concentration: f64,
    pub cracking_rate: f64, // negative generation rate
    pub generated_rate: f64,
    pub generated_cum: f64,
    pub expelled_rate: f64, // flux
    pub expelled_cum: f64,
    pub retained: f64,
    pub adsorped_mol: f64,
    pub free_mol: f64,
    pub expelled_mol: f64,
}

/// Generation/expulsion summary of a species group.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupResult {
    pub generated_cum: f64,
    pub generated_rate: f64,
    pub expelled_cum: f64,
    pub expelled_rate: f64,
}

impl GroupResult {
    pub fn accumulate(&mut self, other: &GroupResult) {
        self.generated_cum += other.generated_cum;
        self.generated_rate += other.generated_rate;
        self.expelled_cum += other.expelled_cum;
        self.expelled_rate += other.expelled_rate;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupResults {
    pub oil: GroupResult,
    pub hc_gas: GroupResult,
    pub wet_gas: GroupResult,
    pub dry_gas: GroupResult,
}

/// Everything a node reports for one time instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceRockNodeOutput {
    pub current_time: f64,
    pub species_results: Vec<SpeciesResult>,
    pub groups: GroupResults,
    pub api_inst: f64,
    pub api_cum: f64,
    pub gor_inst: f64,
    pub gor_cum: f64,
    pub cgr_inst: f64,
    pub cgr_cum: f64,
    pub gas_wetness_inst: f64,
    pub gas_wetness_cum: f64,
    pub aromaticity_inst: f64,
    pub aromaticity_cum: f64,
    pub kerogen_conversion_ratio: f64,
    pub exm_tot: f64, // total expelled mass, kg/m²
    pub total_retained_om: f64,
    pub mobile_om_conc: f64,
    pub toc: f64,
}

impl SourceRockNodeOutput {
    pub fn new(current_time: f64) -> Self {
        Self {
            current_time,
            ..Self::default()
        }
    }

    pub fn species_result(&self, name: &str) -> Option<&SpeciesResult> {
        self.species_results.iter().find(|r| r.name == name)
    }

    pub fn species_result_mut(&mut self, name: &str) -> Option<&mut SpeciesResult> {
        self.species_results.iter_mut().find(|r| r.name == name)
    }

    pub fn add_species_result(&mut self, result: SpeciesResult) {
        self.species_results.push(result);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
