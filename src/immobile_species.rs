// src/immobile_species.rs - Retained immobile residues (coke, heteroatom solids)

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImmobileSpeciesId {
    Precoke,
    Coke1,
    Hetero1,
    Coke2,
    CokeS,
}

impl ImmobileSpeciesId {
    pub const ALL: [ImmobileSpeciesId; 5] = [
        ImmobileSpeciesId::Precoke,
        ImmobileSpeciesId::Coke1,
        ImmobileSpeciesId::Hetero1,
        ImmobileSpeciesId::Coke2,
        ImmobileSpeciesId::CokeS,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImmobileSpeciesId::Precoke => "precoke",
            ImmobileSpeciesId::Coke1 => "coke1",
            ImmobileSpeciesId::Hetero1 => "Hetero1",
            ImmobileSpeciesId::Coke2 => "coke2",
            ImmobileSpeciesId::CokeS => "CokeS",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "precoke" => Some(ImmobileSpeciesId::Precoke),
            "coke1" => Some(ImmobileSpeciesId::Coke1),
            "Hetero1" => Some(ImmobileSpeciesId::Hetero1),
            "coke2" => Some(ImmobileSpeciesId::Coke2),
            "CokeS" => Some(ImmobileSpeciesId::CokeS),
            _ => None,
        }
    }
}

/// Densities (kg/m³) used when the chemical model does not define the species.
pub static DEFAULT_IMMOBILE_DENSITIES: Lazy<HashMap<ImmobileSpeciesId, f64>> = Lazy::new(|| {
    use ImmobileSpeciesId::*;
    let mut m = HashMap::new();
    m.insert(Precoke, 1150.0);
    m.insert(Coke1, 1300.0);
    m.insert(Hetero1, 1200.0);
    m.insert(Coke2, 1500.0);
    m.insert(CokeS, 1400.0);
    m
});

#[derive(Debug, Clone, PartialEq)]
pub struct ImmobileSpecies {
    retained: [f64; 5], // kg/m²
    densities: [f64; 5],
}

impl Default for ImmobileSpecies {
    fn default() -> Self {
        let mut densities = [0.0; 5];
        for id in ImmobileSpeciesId::ALL {
            densities[id.index()] = DEFAULT_IMMOBILE_DENSITIES.get(&id).copied().unwrap_or(0.0);
        }
        Self {
            retained: [0.0; 5],
            densities,
        }
    }
}

impl ImmobileSpecies {
    pub fn retained(&self, id: ImmobileSpeciesId) -> f64 {
        self.retained[id.index()]
    }

    pub fn set_retained(&mut self, id: ImmobileSpeciesId, mass: f64) {
        self.retained[id.index()] = mass.max(0.0);
    }

    pub fn add_retained(&mut self, id: ImmobileSpeciesId, mass: f64) {
        self.set_retained(id, self.retained(id) + mass);
    }

    pub fn density(&self, id: ImmobileSpeciesId) -> f64 {
        self.densities[id.index()]
    }

    pub fn set_density(&mut self, id: ImmobileSpeciesId, density: f64) {
        if density > 0.0 {
            self.densities[id.index()] = density;
        }
    }

    pub fn total_retained(&self) -> f64 {
        self.retained.iter().sum()
    }

    /// Volume fraction of rock occupied by the residues.
    pub fn retained_volume(&self, thickness: f64) -> f64 {
        if thickness <= 0.0 {
            return 0.0;
        }
        ImmobileSpeciesId::ALL
            .iter()
            .filter(|id| self.density(**id) > 0.0)
            .map(|id| self.retained(*id) / self.density(*id))
            .sum::<f64>()
            / thickness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_retained_volume_uses_densities() {
        let mut immobiles = ImmobileSpecies::default();
        immobiles.set_density(ImmobileSpeciesId::Coke2, 2000.0);
        immobiles.set_retained(ImmobileSpeciesId::Coke2, 40.0);
        immobiles.set_retained(ImmobileSpeciesId::Precoke, 11.5);

        // 40/2000 + 11.5/1150 over 10 m
        assert_relative_eq!(immobiles.retained_volume(10.0), 0.003, epsilon = 1e-12);
        assert_eq!(immobiles.retained_volume(0.0), 0.0);
    }

    #[test]
    fn test_retained_never_negative() {
        let mut immobiles = ImmobileSpecies::default();
        immobiles.add_retained(ImmobileSpeciesId::Coke1, 1.0);
        immobiles.add_retained(ImmobileSpeciesId::Coke1, -3.0);
        assert_eq!(immobiles.retained(ImmobileSpeciesId::Coke1), 0.0);
        assert_eq!(ImmobileSpeciesId::from_str("Hetero1"), Some(ImmobileSpeciesId::Hetero1));
    }
}
