use crate::constants::{MIN_PERMEABILITY_MD, TO_KELVIN};
use serde::{Deserialize, Serialize};

/// Gas adsorption capacity of organic-rich rock.
pub trait AdsorptionFunction: Send + Sync + std::fmt::Debug {
    /// Capacity in m³ of surface gas per m³ of rock.
    fn compute(&self, temperature_k: f64, pore_pressure_pa: f64, toc: f64, bulk_density: f64) -> f64;

    /// Langmuir volume (cc/g rock) at the source-rock temperature.
    fn vl_sr_temperature(&self, temperature_k: f64, toc: f64) -> f64;

    /// Langmuir volume (cc/g rock) at the reference temperature.
    fn vl_reference_temperature(&self, toc: f64) -> f64;
}

/// Langmuir isotherm whose volume declines linearly with temperature and scales with TOC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangmuirAdsorptionFunction {
    pub reference_temperature_c: f64,
    pub vl_reference: f64, // cc/g TOC
    pub vl_temperature_gradient: f64, // cc/g TOC per °C
    pub langmuir_pressure_pa: f64,
}

impl Default for LangmuirAdsorptionFunction {
    fn default() -> Self {
        Self {
            reference_temperature_c: 30.0,
            vl_reference: 60.0,
            vl_temperature_gradient: -0.3,
            langmuir_pressure_pa: 5.0e6,
        }
    }
}

impl LangmuirAdsorptionFunction {
    fn langmuir_volume_per_toc(&self, temperature_c: f64) -> f64 {
        (self.vl_reference + self.vl_temperature_gradient * (temperature_c - self.reference_temperature_c)).max(0.0)
    }
}

impl AdsorptionFunction for LangmuirAdsorptionFunction {
    fn compute(&self, temperature_k: f64, pore_pressure_pa: f64, toc: f64, bulk_density: f64) -> f64 {
        let pressure = pore_pressure_pa.max(0.0);
        let vl = self.vl_sr_temperature(temperature_k, toc);
        vl * pressure / (pressure + self.langmuir_pressure_pa) * bulk_density / 1000.0
    }

    fn vl_sr_temperature(&self, temperature_k: f64, toc: f64) -> f64 {
        self.langmuir_volume_per_toc(temperature_k - TO_KELVIN) * toc / 100.0
    }

    fn vl_reference_temperature(&self, toc: f64) -> f64 {
        self.vl_reference * toc / 100.0
    }
}

/// Irreducible water saturation as a log-linear function of permeability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrreducibleWaterSaturationFunction {
    pub a: f64,
    pub b: f64,
}

impl Default for IrreducibleWaterSaturationFunction {
    fn default() -> Self {
        Self { a: -0.1, b: 0.4 }
    }
}

impl IrreducibleWaterSaturationFunction {
    pub fn compute(&self, permeability_md: f64) -> f64 {
        let permeability = permeability_md.max(MIN_PERMEABILITY_MD);
        (self.a * permeability.log10() + self.b).clamp(0.0, 1.0)
    }
}
