pub mod constants;
pub mod error;
pub mod element;
pub mod component;
pub mod general_parameters;
pub mod ratio_expression;
pub mod species;
pub mod reaction;
pub mod species_state;
pub mod immobile_species;
pub mod simulator_state;
pub mod node_input;
pub mod node_output;
pub mod chemical_model;
pub mod pvt;
pub mod adsorption_function;
pub mod adsorption;
pub mod otgc;
pub mod config;
pub mod simulator;
pub mod source_rock_node;
pub mod format_utils;
pub mod history;
