pub const TO_KELVIN: f64 = 273.15;
pub const GAS_CONSTANT_J_PER_MOL_K: f64 = 8.314_472;
pub const SECONDS_PER_MA: f64 = 3.155_76e13; // Julian million years
pub const BOLTZMANN_OVER_PLANCK_PER_K_S: f64 = 2.083_661_2e10;
pub const BOLTZMANN_OVER_PLANCK_PER_K_MA: f64 = BOLTZMANN_OVER_PLANCK_PER_K_S * SECONDS_PER_MA;

// Van Krevelen correlations
pub const VAN_KREVELEN_HC_CORRECTOR: f64 = 0.5; // O atoms count as half an H for aromaticity
pub const AROMATICITY_QUADRATIC_A: f64 = 5.2;
pub const AROMATICITY_QUADRATIC_X: f64 = 6.9;
pub const FORM_VOL_1: f64 = 9.9; // cm³/mol per C atom
pub const FORM_VOL_2: f64 = 3.1; // cm³/mol per H atom
pub const FORM_VOL_3: f64 = 3.75; // cm³/mol per O atom
pub const VOL_RING_1: f64 = 8.6;
pub const VOL_RING_2: f64 = 0.5;

// Species with a coking entropy correction
pub const COKING_ENTROPY_SPECIES: [&str; 4] = ["asphaltenes", "resins", "C15+Aro", "C6-14Aro"];

// Initial H/C transformation anchors (vitrinite reflectance, %Ro)
pub const VRE_1: f64 = 0.2;
pub const VRE_2: f64 = 0.5;
pub const VRE_3: f64 = 0.8;
pub const VRE_4: f64 = 1.0;
pub const VRE_TOC_THRESHOLD: f64 = 0.5; // TOC stays at its initial value below this
pub const KEROGEN_ORDER: f64 = 1.5;

// Expulsion post-processing
pub const API_C1: f64 = 141.5;
pub const API_C2: f64 = 1000.0;
pub const API_C3: f64 = 131.5;
pub const API_DEFAULT: f64 = 0.001;
pub const FLUX_OIL_VOLUME_ZERO: f64 = 1.0e-41; // instantaneous volumes
pub const CUM_OIL_VOLUME_ZERO: f64 = 1.0e-39; // cumulative volumes
pub const UNDEFINED_VALUE: f64 = 99999.0;
pub const GOR_UPPER_BOUND: f64 = 1.0e10;
pub const CGR_GOR_THRESHOLD: f64 = 10_000.0;
pub const KEROGEN_CONVERSION_MIN_THICKNESS_M: f64 = 0.01;
pub const KEROGEN_CONVERSION_ZERO: f64 = 0.001;

// Adsorption / phase split
pub const ADSORPTION_MIN_THICKNESS_M: f64 = 1.0e-2;
pub const SURFACE_PRESSURE_PA: f64 = 1.013_25e5;
pub const STANDARD_TEMPERATURE_K: f64 = 288.705_555_6; // 60 °F
pub const PHASE_VOLUME_TOLERANCE: f64 = 1.0e-10;
pub const MIN_PERMEABILITY_MD: f64 = 1.0e-12;

// Unit conversions
pub const CUBIC_METRES_TO_BARREL: f64 = 6.289_810_770_4;
pub const CUBIC_METRES_TO_CUBIC_FEET: f64 = 35.314_666_7;
pub const KILOGRAMME_TO_US_TON: f64 = 1.0 / 907.184_74;
pub const KM2_TO_ACRES: f64 = 247.105_381;
pub const METHANE_MOLES_PER_M3_SURFACE: f64 = 42.306_553; // mol/m³ at standard conditions

// Sequencing
pub const REFERENCE_TIME_TOLERANCE_MA: f64 = 1.0e-9;

// Immobile species
pub const IMMOBILE_SPECIES_NAMES: [&str; 7] = [
    "kerogen",
    "preasphalt",
    "precoke",
    "coke1",
    "coke2",
    "Hetero1",
    "CokeS",
];
pub const KEROGEN: &str = "kerogen";
pub const PREASPHALT: &str = "preasphalt";
pub const COKE2: &str = "coke2";
