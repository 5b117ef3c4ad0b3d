/// A chemical element of the network with its atomic weight (g/mol).
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub atomic_weight: f64,
}

impl Element {
    pub fn new(name: &str, atomic_weight: f64) -> Self {
        Self {
            name: name.to_string(),
            atomic_weight,
        }
    }
}

/// Element letters that carry a mass balance when solving stoichiometry, in order.
pub const BALANCE_ELEMENTS: [&str; 3] = ["H", "O", "N"];
pub const CARBON: &str = "C";
pub const HYDROGEN: &str = "H";
pub const OXYGEN: &str = "O";
pub const NITROGEN: &str = "N";
