// src/history.rs - fixed-width time series written by history collectors

use crate::component::{ComponentId, ComponentMasses};
use crate::constants::*;
use crate::error::Result;
use crate::format_utils::{column, header};
use crate::pvt::{PhaseId, PvtFlash};
use crate::source_rock_node::{HistoryCollector, SourceRockNode};
use std::any::Any;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

const COLUMN_WIDTH: usize = 21;
const COMPONENT_COLUMN_WIDTH: usize = 30;
const SATURATION_COLUMN_WIDTH: usize = 24;
const RATE_COLUMN_WIDTH: usize = 36;

/// Rows of fixed-width text under a single header line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryTable {
    header: String,
    rows: Vec<String>,
}

impl HistoryTable {
    pub fn new(columns: &[(String, usize)]) -> Self {
        Self {
            header: columns.iter().map(|(name, width)| header(name, *width)).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, values: &[(f64, usize)]) {
        self.rows.push(values.iter().map(|(value, width)| column(*value, *width)).collect());
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{}", self.header)?;
        for row in &self.rows {
            writeln!(writer, "{}", row)?;
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Unit conversions from per-m³-of-rock quantities to reporting units.
#[derive(Debug, Clone, Copy)]
struct ReportingFactors {
    scf_per_ton: f64, // m³ gas / m³ rock -> SCF / US ton rock
    bbl_per_ton: f64,
    bcf_per_acre: f64, // m³ / m² -> BCF / acre
    mmbbl_per_acre: f64,
}

impl ReportingFactors {
    fn new(bulk_density: f64) -> Self {
        let tons_per_m3 = KILOGRAMME_TO_US_TON * bulk_density;
        let per_ton = |factor: f64| if tons_per_m3 > 0.0 { factor / tons_per_m3 } else { 0.0 };
        Self {
            scf_per_ton: per_ton(CUBIC_METRES_TO_CUBIC_FEET),
            bbl_per_ton: per_ton(CUBIC_METRES_TO_BARREL),
            bcf_per_acre: CUBIC_METRES_TO_CUBIC_FEET * 1.0e6 / 1.0e9 / KM2_TO_ACRES,
            mmbbl_per_acre: CUBIC_METRES_TO_BARREL / KM2_TO_ACRES,
        }
    }
}

/// Adsorption, retention and phase-volume history of one node.
#[derive(Debug)]
pub struct AdsorptionHistory {
    flash: Arc<dyn PvtFlash>,
    table: HistoryTable,
}

impl AdsorptionHistory {
    pub const NAME: &'static str = "AdsorptionHistory";

    pub fn new(flash: Arc<dyn PvtFlash>) -> Self {
        Self {
            flash,
            table: HistoryTable::new(&Self::columns()),
        }
    }

    pub fn table(&self) -> &HistoryTable {
        &self.table
    }

    fn columns() -> Vec<(String, usize)> {
        let mut columns: Vec<(String, usize)> = [
            "Time-Ma",
            "Thickness-m",
            "Temperature-C",
            "Pressure-Pa",
            "Porosity-frac",
            "Permeability-mD",
            "C1Adsorped-SCF/ton",
            "C1Desorped-SCF/ton",
            "AdsorpCap-scf/ton",
            "Pyrobitumen-frac",
            "OilVolume-BBL/ton",
            "GasVolume-SCF/ton",
            "OilVolume-MMBBL/acre",
            "GasVolume-BCF/acre",
            "IWS",
            "HcSat",
        ]
        .iter()
        .map(|name| (name.to_string(), COLUMN_WIDTH))
        .collect();

        for id in ComponentId::ALL {
            for suffix in ["Expel-kg/m^2", "Retain-kg/m^2", "Gx5Expel-kg/m^2"] {
                columns.push((format!("{}{}", id.history_name(), suffix), COMPONENT_COLUMN_WIDTH));
            }
        }

        for name in [
            "FracOfAdCap",
            "HcVapourSat",
            "HcLiquidSat",
            "VapourDens-kg/m^3",
            "LiquidDens-kg/m^3",
            "TOC",
            "VLSRTemp-cc",
            "VLRefTemp-cc",
            "VRe",
        ] {
            columns.push((name.to_string(), COLUMN_WIDTH));
        }
        columns.push(("WaterSaturation-frac".to_string(), SATURATION_COLUMN_WIDTH));
        columns.push(("EffectivePorosity-frac".to_string(), SATURATION_COLUMN_WIDTH));
        columns
    }
}

impl HistoryCollector for AdsorptionHistory {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn collect(&mut self, node: &SourceRockNode) {
        let (Some(state), Some(input)) = (node.state(), node.last_computed_input()) else {
            return;
        };
        let thickness = state.thickness;
        if thickness <= 0.0 {
            return;
        }
        let factors = ReportingFactors::new(node.mean_bulk_density());
        let molar_volume = |mol: f64| mol / METHANE_MOLES_PER_M3_SURFACE; // m³ surface gas per m³ rock

        let c1 = state.species_state(ComponentId::C1.as_str());
        let adsorped = c1.map(|s| s.adsorped_mol).unwrap_or_default();
        let desorped = c1.map(|s| s.desorped_mol).unwrap_or_default();
        let capacity = c1.map(|s| s.adsorption_capacity).unwrap_or_default();

        let mut retained = ComponentMasses::zero();
        for id in ComponentId::ALL {
            retained[id] = state.liquid_components[id] + state.vapour_components[id];
        }
        let surface = self.flash.compute(STANDARD_TEMPERATURE_K, SURFACE_PRESSURE_PA, &retained);
        let surface_volume = |phase: PhaseId| {
            let density = surface.density[phase];
            if density > 0.0 { surface.phase_mass(phase) / density } else { 0.0 }
        };
        let oil_volume = surface_volume(PhaseId::Liquid); // m³/m²
        let gas_volume = surface_volume(PhaseId::Vapour);

        let porosity = state.effective_porosity;
        let saturation = |volume: f64| if porosity > 0.0 { volume / porosity } else { 0.0 };

        let mut row: Vec<(f64, usize)> = [
            input.current_time,
            thickness,
            input.temperature_c,
            input.pore_pressure,
            input.porosity,
            input.permeability,
            molar_volume(adsorped) * factors.scf_per_ton,
            molar_volume(desorped) * factors.scf_per_ton,
            molar_volume(capacity) * factors.scf_per_ton,
            state.immobiles.retained_volume(thickness),
            oil_volume / thickness * factors.bbl_per_ton,
            gas_volume / thickness * factors.scf_per_ton,
            oil_volume * factors.mmbbl_per_acre,
            gas_volume * factors.bcf_per_acre,
            state.irreducible_water_saturation,
            state.hc_saturation,
        ]
        .iter()
        .map(|value| (*value, COLUMN_WIDTH))
        .collect();

        for id in ComponentId::ALL {
            let species = state.species_state(id.as_str());
            let expelled = species.map(|s| s.mass_expelled_from_source_rock).unwrap_or_default();
            let retained = species.map(|s| s.retained).unwrap_or_default();
            let genex_expelled = species.map(|s| s.expelled_mass).unwrap_or_default();
            for value in [expelled, retained, genex_expelled] {
                row.push((value, COMPONENT_COLUMN_WIDTH));
            }
        }

        let fraction_of_capacity = if capacity > 0.0 { adsorped / capacity } else { 0.0 };
        for value in [
            fraction_of_capacity,
            saturation(state.retained_vapour_volume),
            saturation(state.retained_liquid_volume),
            state.sub_surface_densities.vapour,
            state.sub_surface_densities.liquid,
            state.current_toc,
            state.vl_sr_temperature,
            state.vl_reference_temperature,
            input.vre,
        ] {
            row.push((value, COLUMN_WIDTH));
        }
        row.push((1.0 - state.hc_saturation, SATURATION_COLUMN_WIDTH));
        row.push((state.effective_porosity, SATURATION_COLUMN_WIDTH));

        self.table.push_row(&row);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Generation and expulsion history of one node.
#[derive(Debug, Clone)]
pub struct GenexHistory {
    table: HistoryTable,
}

impl GenexHistory {
    pub const NAME: &'static str = "GenexHistory";

    const GROUPS: [&'static str; 4] = ["Oil", "HcGas", "WetGas", "DryGas"];

    pub fn new() -> Self {
        Self {
            table: HistoryTable::new(&Self::columns()),
        }
    }

    pub fn table(&self) -> &HistoryTable {
        &self.table
    }

    fn columns() -> Vec<(String, usize)> {
        let mut columns: Vec<(String, usize)> = ["Time-Ma", "Temperature-C", "VRe", "TOC", "KerogenConversion"]
            .iter()
            .map(|name| (name.to_string(), COLUMN_WIDTH))
            .collect();

        for group in Self::GROUPS {
            for suffix in ["GeneratedCum", "GeneratedRate", "ExpelledCum", "ExpelledRate"] {
                columns.push((format!("{}{}", group, suffix), COLUMN_WIDTH));
            }
        }
        for id in ComponentId::ALL {
            for suffix in ["ExpelledCum-kg/m^2", "ExpelledRate-kg/m^2/Ma"] {
                columns.push((format!("{}{}", id.history_name(), suffix), RATE_COLUMN_WIDTH));
            }
        }
        for name in [
            "ApiInst",
            "ApiCum",
            "GorInst",
            "GorCum",
            "CgrInst",
            "CgrCum",
            "GasWetnessInst",
            "GasWetnessCum",
            "AromaticityInst",
            "AromaticityCum",
        ] {
            columns.push((name.to_string(), COLUMN_WIDTH));
        }
        columns
    }
}

impl Default for GenexHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryCollector for GenexHistory {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn collect(&mut self, node: &SourceRockNode) {
        let (Some(output), Some(input)) = (node.last_output(), node.last_computed_input()) else {
            return;
        };

        let mut row: Vec<(f64, usize)> = [
            output.current_time,
            input.temperature_c,
            input.vre,
            output.toc,
            output.kerogen_conversion_ratio,
        ]
        .iter()
        .map(|value| (*value, COLUMN_WIDTH))
        .collect();

        let groups = &output.groups;
        for group in [groups.oil, groups.hc_gas, groups.wet_gas, groups.dry_gas] {
            for value in [group.generated_cum, group.generated_rate, group.expelled_cum, group.expelled_rate] {
                row.push((value, COLUMN_WIDTH));
            }
        }
        for id in ComponentId::ALL {
            let result = output.species_result(id.as_str());
            row.push((result.map(|r| r.expelled_cum).unwrap_or_default(), RATE_COLUMN_WIDTH));
            row.push((result.map(|r| r.expelled_rate).unwrap_or_default(), RATE_COLUMN_WIDTH));
        }
        for value in [
            output.api_inst,
            output.api_cum,
            output.gor_inst,
            output.gor_cum,
            output.cgr_inst,
            output.cgr_cum,
            output.gas_wetness_inst,
            output.gas_wetness_cum,
            output.aromaticity_inst,
            output.aromaticity_cum,
        ] {
            row.push((value, COLUMN_WIDTH));
        }

        self.table.push_row(&row);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
