use crate::element::{BALANCE_ELEMENTS, Element};
use crate::error::ConfigError;
use crate::ratio_expression::RatioExpression;
use crate::species::Species;
use nalgebra::{DMatrix, DVector};

const PIVOT_TOLERANCE: f64 = 1.0e-12;

/// Mass ratio constraint `m(product_1) = ratio(Arom) * m(product_2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionRatio {
    pub product_1: String,
    pub product_2: String,
    pub expression: RatioExpression,
}

/// A mother species cracking into a set of products.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    mother: String,
    products: Vec<String>,
    ratios: Vec<ReactionRatio>,
}

impl Reaction {
    pub fn new(mother: &str, products: Vec<String>) -> Self {
        Self {
            mother: mother.to_string(),
            products,
            ratios: Vec::new(),
        }
    }

    pub fn mother(&self) -> &str {
        &self.mother
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn ratios(&self) -> &[ReactionRatio] {
        &self.ratios
    }

    pub fn add_ratio(&mut self, ratio: ReactionRatio) -> Result<(), ConfigError> {
        for product in [&ratio.product_1, &ratio.product_2] {
            if !self.products.contains(product) {
                return Err(ConfigError::UnknownSpecies {
                    species: product.clone(),
                    context: format!("reaction ratio of {}", self.mother),
                });
            }
        }
        self.ratios.push(ratio);
        Ok(())
    }

    /// Solves the product mass factors at the given preasphaltene aromaticity.
    ///
    /// Equations, in order: every ratio constraint, total mass, then H, O and N
    /// mass balances against the mother until the system is square.
    pub fn compute_mass_factors(
        &self,
        species: &[Species],
        elements: &[Element],
        preasphaltene_aromaticity: f64,
    ) -> Result<Vec<(String, f64)>, ConfigError> {
        let m = self.products.len();
        let find = |name: &str| {
            species
                .iter()
                .find(|s| s.name() == name)
                .ok_or_else(|| ConfigError::UnknownSpecies {
                    species: name.to_string(),
                    context: format!("reaction of {}", self.mother),
                })
        };
        let mother = find(&self.mother)?;
        let products = self
            .products
            .iter()
            .map(|name| find(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows: Vec<(Vec<f64>, f64)> = Vec::with_capacity(m);
        for ratio in &self.ratios {
            let mut row = vec![0.0; m];
            let index_of = |name: &str| self.products.iter().position(|p| p == name).unwrap_or(0);
            let r = ratio
                .expression
                .evaluate(preasphaltene_aromaticity)
                .map_err(|message| ConfigError::RatioExpression {
                    mother: self.mother.clone(),
                    expression: ratio.expression.source().to_string(),
                    message,
                })?;
            row[index_of(&ratio.product_1)] += 1.0;
            row[index_of(&ratio.product_2)] -= r;
            rows.push((row, 0.0));
        }
        rows.push((vec![1.0; m], 1.0));

        for element in BALANCE_ELEMENTS {
            if rows.len() >= m {
                break;
            }
            let weight = elements
                .iter()
                .find(|e| e.name == element)
                .map(|e| e.atomic_weight)
                .unwrap_or(0.0);
            let mass_fraction = |s: &Species| {
                let mol_weight = s.compute_mol_weight(elements);
                if mol_weight > 0.0 {
                    s.composition(element) * weight / mol_weight
                } else {
                    0.0
                }
            };
            let row = products.iter().map(|p| mass_fraction(p)).collect();
            rows.push((row, mass_fraction(mother)));
        }

        if rows.len() != m {
            return Err(ConfigError::UnsolvableReaction {
                mother: self.mother.clone(),
                products: m,
                equations: rows.len(),
            });
        }

        let factors = solve_linear_system(&rows).ok_or_else(|| ConfigError::SingularReaction {
            mother: self.mother.clone(),
        })?;

        self.products
            .iter()
            .zip(factors)
            .map(|(product, factor)| {
                if factor > 0.0 && factor.is_finite() {
                    Ok((product.clone(), factor))
                } else {
                    Err(ConfigError::NonPositiveMassFactor {
                        mother: self.mother.clone(),
                        product: product.clone(),
                        factor,
                    })
                }
            })
            .collect()
    }
}

/// LU solve of a square system; `None` when a pivot vanishes.
fn solve_linear_system(rows: &[(Vec<f64>, f64)]) -> Option<Vec<f64>> {
    let n = rows.len();
    let matrix = DMatrix::from_fn(n, n, |i, j| rows[i].0[j]);
    let rhs = DVector::from_iterator(n, rows.iter().map(|(_, value)| *value));
    let lu = matrix.lu();
    if lu.u().diagonal().iter().any(|pivot| pivot.abs() < PIVOT_TOLERANCE) {
        return None;
    }
    lu.solve(&rhs).map(|solution| solution.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn elements() -> Vec<Element> {
        vec![
            Element::new("C", 12.011),
            Element::new("H", 1.008),
            Element::new("O", 15.999),
            Element::new("N", 14.007),
        ]
    }

    fn species(names: &[&str]) -> Vec<Species> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut s = Species::new(name, i + 1);
                s.set_composition("C", 1.0);
                s.set_composition("H", 1.0 + i as f64 * 0.5);
                s
            })
            .collect()
    }

    fn ratio(p1: &str, p2: &str, expression: &str) -> ReactionRatio {
        ReactionRatio {
            product_1: p1.to_string(),
            product_2: p2.to_string(),
            expression: RatioExpression::parse(expression).unwrap(),
        }
    }

    #[test]
    fn test_ratios_fully_determine_three_products() {
        let all = species(&["asphaltenes", "resins", "C15+Aro", "C1"]);
        let mut reaction = Reaction::new(
            "asphaltenes",
            vec!["resins".to_string(), "C15+Aro".to_string(), "C1".to_string()],
        );
        reaction.add_ratio(ratio("resins", "C15+Aro", "2")).unwrap();
        reaction.add_ratio(ratio("C15+Aro", "C1", "Arom * 10")).unwrap();

        let factors = reaction.compute_mass_factors(&all, &elements(), 0.5).unwrap();
        // resins = 2 aro, aro = 5 c1, total 1 => c1 = 1/16
        assert_relative_eq!(factors[2].1, 1.0 / 16.0, epsilon = 1e-12);
        assert_relative_eq!(factors[1].1, 5.0 / 16.0, epsilon = 1e-12);
        assert_relative_eq!(factors[0].1, 10.0 / 16.0, epsilon = 1e-12);
        let total: f64 = factors.iter().map(|(_, f)| f).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hydrogen_balance_closes_missing_ratio() {
        let mut all = species(&["resins", "C15+Sat", "C1"]);
        all[0].set_composition("H", 1.5);
        all[1].set_composition("H", 1.0);
        all[2].set_composition("H", 4.0);
        let reaction = Reaction::new("resins", vec!["C15+Sat".to_string(), "C1".to_string()]);

        let factors = reaction.compute_mass_factors(&all, &elements(), 0.5).unwrap();
        let h_fraction = |s: &Species| s.composition("H") * 1.008 / s.compute_mol_weight(&elements());
        let balance = factors[0].1 * h_fraction(&all[1]) + factors[1].1 * h_fraction(&all[2]);
        assert_relative_eq!(balance, h_fraction(&all[0]), epsilon = 1e-12);
    }

    #[test]
    fn test_non_positive_factor_is_rejected() {
        let all = species(&["resins", "C15+Sat", "C1"]);
        let mut reaction = Reaction::new("resins", vec!["C15+Sat".to_string(), "C1".to_string()]);
        reaction.add_ratio(ratio("C15+Sat", "C1", "-2")).unwrap();

        let err = reaction.compute_mass_factors(&all, &elements(), 0.5).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveMassFactor { .. }));
    }

    #[test]
    fn test_underdetermined_reaction_is_rejected() {
        let all = species(&["resins", "C15+Sat", "C6-14Sat", "C5", "C4", "C1"]);
        let reaction = Reaction::new(
            "resins",
            vec!["C15+Sat", "C6-14Sat", "C5", "C4", "C1"].into_iter().map(String::from).collect(),
        );
        let err = reaction.compute_mass_factors(&all, &elements(), 0.5).unwrap_err();
        assert!(matches!(err, ConfigError::UnsolvableReaction { equations: 4, .. }));
    }

    #[test]
    fn test_dependent_ratios_are_singular() {
        let all = species(&["asphaltenes", "resins", "C15+Aro", "C1"]);
        let mut reaction = Reaction::new(
            "asphaltenes",
            vec!["resins".to_string(), "C15+Aro".to_string(), "C1".to_string()],
        );
        reaction.add_ratio(ratio("resins", "C15+Aro", "1")).unwrap();
        reaction.add_ratio(ratio("C15+Aro", "resins", "1")).unwrap();

        let err = reaction.compute_mass_factors(&all, &elements(), 0.5).unwrap_err();
        assert!(matches!(err, ConfigError::SingularReaction { .. }));
    }

    #[test]
    fn test_lu_solve_matches_hand_solution() {
        let rows = vec![(vec![2.0, 1.0], 5.0), (vec![1.0, -1.0], 1.0)];
        let solution = solve_linear_system(&rows).unwrap();
        assert_relative_eq!(solution[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(solution[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ratio_must_name_products() {
        let mut reaction = Reaction::new("resins", vec!["C1".to_string()]);
        assert!(reaction.add_ratio(ratio("C2", "C1", "1")).is_err());
    }
}
