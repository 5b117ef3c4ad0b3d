use crate::component::{ComponentId, ComponentMasses};
use crate::constants::{GAS_CONSTANT_J_PER_MOL_K, UNDEFINED_VALUE};
use std::ops::{Index, IndexMut};

const LIQUID_VISCOSITY_PA_S: f64 = 1.0e-3;
const VAPOUR_VISCOSITY_PA_S: f64 = 1.5e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseId {
    Liquid,
    Vapour,
}

impl PhaseId {
    pub const ALL: [PhaseId; 2] = [PhaseId::Liquid, PhaseId::Vapour];
}

/// One scalar per phase.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseValues {
    pub liquid: f64,
    pub vapour: f64,
}

impl Index<PhaseId> for PhaseValues {
    type Output = f64;

    fn index(&self, phase: PhaseId) -> &f64 {
        match phase {
            PhaseId::Liquid => &self.liquid,
            PhaseId::Vapour => &self.vapour,
        }
    }
}

impl IndexMut<PhaseId> for PhaseValues {
    fn index_mut(&mut self, phase: PhaseId) -> &mut f64 {
        match phase {
            PhaseId::Liquid => &mut self.liquid,
            PhaseId::Vapour => &mut self.vapour,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashMode {
    TwoPhase,
    VapourOnly,
    LiquidOnly,
}

impl FlashMode {
    /// Classifies a fluid from its gas/oil mass ratio.
    pub fn from_gorm(gorm: f64) -> Self {
        if gorm <= 0.0 {
            FlashMode::LiquidOnly
        } else if gorm >= UNDEFINED_VALUE {
            FlashMode::VapourOnly
        } else {
            FlashMode::TwoPhase
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlashResult {
    pub liquid: ComponentMasses,
    pub vapour: ComponentMasses,
    pub density: PhaseValues, // kg/m³
    pub viscosity: PhaseValues, // Pa·s
    pub gorm: f64,
    pub mode: FlashMode,
}

impl FlashResult {
    pub fn phase(&self, phase: PhaseId) -> &ComponentMasses {
        match phase {
            PhaseId::Liquid => &self.liquid,
            PhaseId::Vapour => &self.vapour,
        }
    }

    pub fn phase_mass(&self, phase: PhaseId) -> f64 {
        self.phase(phase).sum()
    }
}

/// Gas/oil mass ratio of a fluid split into phases.
pub fn compute_gorm(vapour: &ComponentMasses, liquid: &ComponentMasses) -> f64 {
    let is_gas = |c: ComponentId| !c.is_oil();
    let gas = vapour.sum_where(is_gas) + liquid.sum_where(is_gas);
    let oil = vapour.sum_where(|c| c.is_oil()) + liquid.sum_where(|c| c.is_oil());
    if oil > 0.0 {
        (gas / oil).min(UNDEFINED_VALUE)
    } else if gas > 0.0 {
        UNDEFINED_VALUE
    } else {
        0.0
    }
}

/// Phase-equilibrium calculator: splits component masses into liquid and vapour.
pub trait PvtFlash: Send + Sync + std::fmt::Debug {
    fn compute(&self, temperature_k: f64, pressure_pa: f64, masses: &ComponentMasses) -> FlashResult;
}

/// Deterministic flash with fixed per-component vapour fractions.
///
/// Liquid density mixes component liquid densities by volume; vapour density
/// follows the ideal-gas law.
#[derive(Debug, Clone, Default)]
pub struct SimplePvtFlash;

impl SimplePvtFlash {
    fn liquid_density(liquid: &ComponentMasses) -> f64 {
        let volume: f64 = liquid
            .iter()
            .map(|(id, mass)| mass / id.profile().liquid_density_kg_m3)
            .sum();
        if volume > 0.0 { liquid.sum() / volume } else { 0.0 }
    }

    fn vapour_density(vapour: &ComponentMasses, temperature_k: f64, pressure_pa: f64) -> f64 {
        let moles: f64 = vapour
            .iter()
            .map(|(id, mass)| mass / id.profile().molar_mass_kg_per_mol)
            .sum();
        if moles <= 0.0 || temperature_k <= 0.0 {
            return 0.0;
        }
        let molar_mass = vapour.sum() / moles;
        pressure_pa * molar_mass / (GAS_CONSTANT_J_PER_MOL_K * temperature_k)
    }
}

impl PvtFlash for SimplePvtFlash {
    fn compute(&self, temperature_k: f64, pressure_pa: f64, masses: &ComponentMasses) -> FlashResult {
        let mut liquid = ComponentMasses::zero();
        let mut vapour = ComponentMasses::zero();
        for (id, mass) in masses.iter() {
            let mass = mass.max(0.0);
            let fraction = id.profile().vapour_fraction;
            vapour[id] = mass * fraction;
            liquid[id] = mass - vapour[id];
        }

        let gorm = compute_gorm(&vapour, &liquid);
        FlashResult {
            density: PhaseValues {
                liquid: Self::liquid_density(&liquid),
                vapour: Self::vapour_density(&vapour, temperature_k, pressure_pa),
            },
            viscosity: PhaseValues {
                liquid: LIQUID_VISCOSITY_PA_S,
                vapour: VAPOUR_VISCOSITY_PA_S,
            },
            liquid,
            vapour,
            gorm,
            mode: FlashMode::from_gorm(gorm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{STANDARD_TEMPERATURE_K, SURFACE_PRESSURE_PA};
    use approx::assert_relative_eq;

    #[test]
    fn test_flash_conserves_mass() {
        let mut masses = ComponentMasses::zero();
        masses[ComponentId::C1] = 3.0;
        masses[ComponentId::C4] = 2.0;
        masses[ComponentId::C15PlusSat] = 5.0;

        let result = SimplePvtFlash.compute(350.0, 2.0e7, &masses);
        assert_relative_eq!(
            result.phase_mass(PhaseId::Liquid) + result.phase_mass(PhaseId::Vapour),
            10.0,
            epsilon = 1e-12
        );
        assert_eq!(result.vapour[ComponentId::C1], 3.0);
        assert_eq!(result.liquid[ComponentId::C15PlusSat], 5.0);
        assert_eq!(result.mode, FlashMode::TwoPhase);
    }

    #[test]
    fn test_methane_density_at_standard_conditions() {
        let mut masses = ComponentMasses::zero();
        masses[ComponentId::C1] = 1.0;

        let result = SimplePvtFlash.compute(STANDARD_TEMPERATURE_K, SURFACE_PRESSURE_PA, &masses);
        assert_relative_eq!(result.density.vapour, 0.675, epsilon = 0.01);
        assert_eq!(result.density.liquid, 0.0);
        assert_eq!(result.mode, FlashMode::VapourOnly);
    }
}
