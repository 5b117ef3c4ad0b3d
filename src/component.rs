// src/component.rs - Output species (PVT components) and their classification

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentId {
    Asphaltenes,
    Resins,
    C15PlusAro,
    C15PlusSat,
    C6To14Aro,
    C6To14Sat,
    C5,
    C4,
    C3,
    C2,
    C1,
    COx,
    N2,
    H2S,
}

/// Indicative per-component properties used by the reference flash.
#[derive(Debug, Clone)]
pub struct ComponentProfile {
    pub molar_mass_kg_per_mol: f64,
    pub liquid_density_kg_m3: f64,
    pub vapour_fraction: f64, // share of the component flashed into the vapour phase
}

impl ComponentId {
    pub const COUNT: usize = 14;

    pub const ALL: [ComponentId; ComponentId::COUNT] = [
        ComponentId::Asphaltenes,
        ComponentId::Resins,
        ComponentId::C15PlusAro,
        ComponentId::C15PlusSat,
        ComponentId::C6To14Aro,
        ComponentId::C6To14Sat,
        ComponentId::C5,
        ComponentId::C4,
        ComponentId::C3,
        ComponentId::C2,
        ComponentId::C1,
        ComponentId::COx,
        ComponentId::N2,
        ComponentId::H2S,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentId::Asphaltenes => "asphaltenes",
            ComponentId::Resins => "resins",
            ComponentId::C15PlusAro => "C15+Aro",
            ComponentId::C15PlusSat => "C15+Sat",
            ComponentId::C6To14Aro => "C6-14Aro",
            ComponentId::C6To14Sat => "C6-14Sat",
            ComponentId::C5 => "C5",
            ComponentId::C4 => "C4",
            ComponentId::C3 => "C3",
            ComponentId::C2 => "C2",
            ComponentId::C1 => "C1",
            ComponentId::COx => "COx",
            ComponentId::N2 => "N2",
            ComponentId::H2S => "H2S",
        }
    }

    /// Name without the characters that break column headers.
    pub fn history_name(&self) -> &'static str {
        match self {
            ComponentId::C15PlusAro => "C15plusAro",
            ComponentId::C15PlusSat => "C15plusSat",
            ComponentId::C6To14Aro => "C6_14Aro",
            ComponentId::C6To14Sat => "C6_14Sat",
            other => other.as_str(),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        COMPONENT_NAMES.get(s).copied()
    }

    pub fn is_oil(&self) -> bool {
        self.index() <= ComponentId::C6To14Sat.index()
    }

    pub fn is_hc_gas(&self) -> bool {
        matches!(
            self,
            ComponentId::C5 | ComponentId::C4 | ComponentId::C3 | ComponentId::C2 | ComponentId::C1
        )
    }

    pub fn is_wet_gas(&self) -> bool {
        self.is_hc_gas() && *self != ComponentId::C1
    }

    pub fn is_dry_gas(&self) -> bool {
        *self == ComponentId::C1
    }

    pub fn is_hydrocarbon(&self) -> bool {
        self.is_oil() || self.is_hc_gas()
    }

    pub fn is_c6_14(&self) -> bool {
        matches!(self, ComponentId::C6To14Aro | ComponentId::C6To14Sat)
    }

    pub fn is_aromatic(&self) -> bool {
        matches!(self, ComponentId::C6To14Aro | ComponentId::C15PlusAro)
    }

    pub fn is_saturate(&self) -> bool {
        matches!(self, ComponentId::C6To14Sat | ComponentId::C15PlusSat)
    }

    /// Species are required in every network, except the sulphur component.
    pub fn is_required(&self) -> bool {
        *self != ComponentId::H2S
    }

    pub fn profile(&self) -> &'static ComponentProfile {
        &COMPONENT_PROFILES[self.index()]
    }
}

static COMPONENT_NAMES: Lazy<HashMap<&'static str, ComponentId>> = Lazy::new(|| {
    ComponentId::ALL.iter().map(|id| (id.as_str(), *id)).collect()
});

static COMPONENT_PROFILES: Lazy<Vec<ComponentProfile>> = Lazy::new(|| {
    let profile = |molar_mass_kg_per_mol, liquid_density_kg_m3, vapour_fraction| ComponentProfile {
        molar_mass_kg_per_mol,
        liquid_density_kg_m3,
        vapour_fraction,
    };
    vec![
        profile(0.795, 1100.0, 0.0),  // asphaltenes
        profile(0.595, 1000.0, 0.0),  // resins
        profile(0.320, 950.0, 0.0),   // C15+Aro
        profile(0.350, 850.0, 0.0),   // C15+Sat
        profile(0.140, 860.0, 0.05),  // C6-14Aro
        profile(0.130, 750.0, 0.05),  // C6-14Sat
        profile(0.072, 630.0, 0.3),   // C5
        profile(0.058, 580.0, 0.5),   // C4
        profile(0.044, 500.0, 0.75),  // C3
        profile(0.030, 350.0, 0.9),   // C2
        profile(0.016, 300.0, 1.0),   // C1
        profile(0.044, 800.0, 1.0),   // COx
        profile(0.028, 800.0, 1.0),   // N2
        profile(0.034, 800.0, 1.0),   // H2S
    ]
});

/// Mass of each component (kg/m² of source rock unless stated otherwise).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentMasses([f64; ComponentId::COUNT]);

impl ComponentMasses {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn sum_where(&self, predicate: impl Fn(ComponentId) -> bool) -> f64 {
        ComponentId::ALL
            .iter()
            .filter(|id| predicate(**id))
            .map(|id| self[*id])
            .sum()
    }

    pub fn scale(&mut self, factor: f64) {
        self.0.iter_mut().for_each(|mass| *mass *= factor);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, f64)> + '_ {
        ComponentId::ALL.iter().map(move |id| (*id, self[*id]))
    }
}

impl Index<ComponentId> for ComponentMasses {
    type Output = f64;

    fn index(&self, id: ComponentId) -> &f64 {
        &self.0[id.index()]
    }
}

impl IndexMut<ComponentId> for ComponentMasses {
    fn index_mut(&mut self, id: ComponentId) -> &mut f64 {
        &mut self.0[id.index()]
    }
}
