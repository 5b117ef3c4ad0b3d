use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

macro_rules! general_parameters {
    ($( $(#[$doc:meta])* $field:ident : $name:literal = $default:expr ),+ $(,)?) => {
        /// Empirical constants of the kinetic model.
        ///
        /// Immutable once a simulator is built; overrides come from the
        /// `GeneralParameters` table or from JSON.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct GeneralParameters {
            $( $(#[$doc])* #[serde(rename = $name)] pub $field: f64, )+
        }

        impl Default for GeneralParameters {
            fn default() -> Self {
                Self { $( $field: $default, )+ }
            }
        }

        impl GeneralParameters {
            /// Names as they appear in configuration tables.
            pub const NAMES: &'static [&'static str] = &[$( $name, )+];

            pub fn get_by_name(&self, name: &str) -> Option<f64> {
                match name {
                    $( $name => Some(self.$field), )+
                    _ => None,
                }
            }

            pub fn set_by_name(&mut self, name: &str, value: f64) -> Result<(), ConfigError> {
                match name {
                    $( $name => self.$field = value, )+
                    _ => return Err(ConfigError::UnknownParameter(name.to_string())),
                }
                Ok(())
            }
        }
    };
}

general_parameters! {
    oc_preasphalt_1: "OCpreasphalt1" = -0.0333,
    oc_preasphalt_2: "OCpreasphalt2" = 0.0,
    oc_preasphalt_3: "OCpreasphalt3" = 0.12,
    hc_kerogen_1: "HCkerogen1" = 1.0,
    hc_kerogen_2: "HCkerogen2" = 0.1,
    oc_kerogen_1: "OCkerogen1" = 1.0,
    oc_kerogen_2: "OCkerogen2" = 0.03,
    n_kerogen: "Nkerogen" = 0.1,
    n_preasphalt: "Npreasphalt" = 1.0,
    hc_asph_over_preasphalt: "HCAsphOverPreasphalt" = 0.9,
    oc_asph_over_preasphalt: "OCAsphOverPreasphalt" = 0.6,
    oc_asph_min: "OCasphMin" = 0.01,
    n_asphaltene: "Nasphaltene" = 1.0,
    n_resin: "Nresin" = 1.0,
    oc_precoke_when_hc_preasphalt_zero: "OCprecokeWhenHCpreasphaltZero" = 0.08,
    oc_precoke_per_preasphalt: "OCprecokePerPreasphalt" = 0.04,
    n_precoke: "Nprecoke" = 1.0,
    n_hetero1: "Nhetero1" = 1.0,
    /// Absolute N/C of Hetero2.
    n_hetero2: "Nhetero2" = 0.0,
    /// Absolute N/C of C15+Aro.
    n_c15_plus_aro: "NC15plusAro" = 0.0,
    /// J/mol
    e_cracking_cc: "EcrackingCC" = 2.3e5,
    e_diff_1: "Ediff1" = 2.0e4,
    e_diff_2: "Ediff2" = 1.0e4,
    e_drop_for_s: "EdropForS" = 0.0,
    order_0: "Order0" = 0.4,
    order_per_h_over_c: "OrderPerHoverC" = 0.5,
    preasphaltene_arom_min: "PreasphalteneAromMin" = 0.3,
    preasphaltene_arom_max: "PreasphalteneAromMax" = 0.7,
    /// K
    t0_torbanite: "T0torbanite" = 200.0,
    t0_aromatic: "T0aromatic" = 350.0,
    tuning_const: "TuningConst" = 0.0,
    /// K/Pa
    beta_over_alpha: "BetaOverAlpha" = 5.6e-7,
    /// J/mol
    uj: "Uj" = 3.7e4,
    /// K
    t_lab: "Tlab" = 573.15,
    wbo_min: "WboMin" = 0.01,
    /// J/mol/K per unit coke2 concentration
    ds_per_coke: "dSperCoke" = -150.0,
    biot_over_l2: "BiotOverL2" = 1.0e4,
    hc_max: "HCmax" = 1.8,
    hc_min: "HCmin" = 0.5,
}

impl GeneralParameters {
    /// Defaults overridden by whatever keys the JSON object carries.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parameters(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parameters(e.to_string()))
    }
}
