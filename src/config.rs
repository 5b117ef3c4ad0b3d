use crate::chemical_model::ChemicalModel;
use crate::element::Element;
use crate::error::{ConfigError, GenexError};
use crate::general_parameters::GeneralParameters;
use crate::ratio_expression::RatioExpression;
use crate::reaction::{Reaction, ReactionRatio};
use crate::simulator::SimulatorProperties;
use crate::species::Species;
use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const ELEMENTS_TABLE: &str = "Elements";
pub const SPECIES_TABLE: &str = "Species";
pub const COMPOSITION_TABLE: &str = "SpeciesCompositionByName";
pub const PROPERTIES_TABLE: &str = "SpeciesPropertiesByName";
pub const REACTIONS_TABLE: &str = "ReactionsBySpeciesName";
pub const REACTION_RATIOS_TABLE: &str = "ReactionRatiosBySpeciesName";
pub const SIMULATOR_PROPERTIES_TABLE: &str = "SimulatorProperties";
pub const GENERAL_PARAMETERS_TABLE: &str = "GeneralParameters";
pub const END_OF_TABLE: &str = "[EndOfTable]";

const TABLE_PREFIX: &str = "Table:[";
const SPECIES_PROPERTY_FIELDS: usize = 13;

/// Embedded marine type II network.
pub const DEFAULT_CONFIG: &str = include_str!("data/genex_type_ii.cfg");
const DEFAULT_CONFIG_KEY: &str = "<embedded:genex_type_ii>";

/// Parsed configuration files keyed by path; configurations are immutable once cached.
static CONFIG_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<GenexConfig>>>> = Lazy::new(|| {
    Mutex::new(HashMap::new())
});

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRow {
    pub line: usize,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigTable {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<ConfigRow>,
}

impl ConfigTable {
    fn malformed(&self, row: &ConfigRow) -> ConfigError {
        ConfigError::MalformedRow {
            table: self.name.clone(),
            line: row.line,
            row: row.fields.join(","),
        }
    }

    fn number(&self, value: &str) -> Result<f64, ConfigError> {
        value.parse::<f64>().map_err(|_| ConfigError::InvalidNumber {
            table: self.name.clone(),
            value: value.to_string(),
        })
    }
}

/// A chemical-network configuration file: a sequence of named tables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenexConfig {
    tables: Vec<ConfigTable>,
}

impl GenexConfig {
    /// Load and parse a configuration file, using the cache if available.
    pub fn load<P: AsRef<Path>>(file_path: P) -> Result<Arc<GenexConfig>, GenexError> {
        let path_buf = file_path.as_ref().to_path_buf();

        if let Some(config) = cache().get(&path_buf) {
            return Ok(Arc::clone(config));
        }

        let text = fs::read_to_string(&path_buf)?;
        let config = Arc::new(Self::parse(&text));
        debug!("loaded {} tables from {}", config.tables.len(), path_buf.display());

        cache().insert(path_buf, Arc::clone(&config));
        Ok(config)
    }

    /// The embedded default network.
    pub fn default_config() -> Arc<GenexConfig> {
        let key = PathBuf::from(DEFAULT_CONFIG_KEY);
        let mut cache = cache();
        Arc::clone(cache.entry(key).or_insert_with(|| Arc::new(Self::parse(DEFAULT_CONFIG))))
    }

    pub fn clear_cache() {
        cache().clear();
    }

    pub fn cache_size() -> usize {
        cache().len()
    }

    pub fn parse(text: &str) -> Self {
        let mut tables = Vec::new();
        let mut current: Option<ConfigTable> = None;
        let mut expect_header = false;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if let Some(name) = table_name(line) {
                tables.extend(current.take());
                current = Some(ConfigTable {
                    name: name.to_string(),
                    ..ConfigTable::default()
                });
                expect_header = true;
                continue;
            }
            let Some(table) = current.as_mut() else {
                continue;
            };
            if line.is_empty() || line.starts_with(END_OF_TABLE) {
                tables.extend(current.take());
                continue;
            }

            let fields = split_fields(line);
            if expect_header {
                table.header = fields;
                expect_header = false;
            } else {
                table.rows.push(ConfigRow {
                    line: index + 1,
                    fields,
                });
            }
        }
        tables.extend(current);
        Self { tables }
    }

    pub fn tables(&self) -> &[ConfigTable] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&ConfigTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn simulator_properties(&self) -> Result<SimulatorProperties, ConfigError> {
        let mut properties = SimulatorProperties::default();
        if let Some(table) = self.table(SIMULATOR_PROPERTIES_TABLE) {
            for row in &table.rows {
                let [key, value] = row.fields.as_slice() else {
                    return Err(table.malformed(row));
                };
                properties.set_by_name(key, value)?;
            }
        }
        Ok(properties)
    }

    /// General parameters, taking the table's values unless defaults were requested.
    pub fn general_parameters(&self, use_defaults: bool) -> Result<GeneralParameters, ConfigError> {
        let mut params = GeneralParameters::default();
        if use_defaults {
            return Ok(params);
        }
        if let Some(table) = self.table(GENERAL_PARAMETERS_TABLE) {
            for row in &table.rows {
                let [name, value] = row.fields.as_slice() else {
                    return Err(table.malformed(row));
                };
                params.set_by_name(name, table.number(value)?)?;
            }
        }
        Ok(params)
    }

    /// Builds the network as written, without any preprocessing.
    pub fn build_chemical_model(&self, params: GeneralParameters) -> Result<ChemicalModel, ConfigError> {
        let mut model = ChemicalModel::new(params);

        if let Some(table) = self.table(ELEMENTS_TABLE) {
            for row in &table.rows {
                let [name, weight] = row.fields.as_slice() else {
                    return Err(table.malformed(row));
                };
                model.add_element(Element::new(name, table.number(weight)?))?;
            }
        }

        if let Some(table) = self.table(SPECIES_TABLE) {
            for row in &table.rows {
                let [name, id] = row.fields.as_slice() else {
                    return Err(table.malformed(row));
                };
                let id = id.parse::<usize>().map_err(|_| ConfigError::InvalidNumber {
                    table: table.name.clone(),
                    value: id.clone(),
                })?;
                model.add_species(Species::new(name, id))?;
            }
        }

        if let Some(table) = self.table(COMPOSITION_TABLE) {
            // column headers end in the element symbol, e.g. AtomC
            let elements: Vec<String> = table
                .header
                .iter()
                .skip(1)
                .map(|column| column.chars().last().map(String::from).unwrap_or_default())
                .collect();
            for row in &table.rows {
                let Some((name, values)) = row.fields.split_first() else {
                    return Err(table.malformed(row));
                };
                if values.len() > elements.len() {
                    return Err(table.malformed(row));
                }
                for (element, value) in elements.iter().zip(values) {
                    model.update_species_composition_by_element_name(name, element, table.number(value)?)?;
                }
            }
        }

        if let Some(table) = self.table(PROPERTIES_TABLE) {
            for row in &table.rows {
                if row.fields.len() != SPECIES_PROPERTY_FIELDS {
                    return Err(table.malformed(row));
                }
                let values = row.fields[1..]
                    .iter()
                    .map(|v| table.number(v))
                    .collect::<Result<Vec<_>, _>>()?;
                let props = model.species_mut(&row.fields[0])?.properties_mut();
                props.mol_weight = values[0];
                props.density = values[1];
                props.activation_energy_1 = values[2];
                props.activation_energy_2 = values[3];
                props.entropy = values[4];
                props.volume = values[5];
                props.reaction_order = values[6];
                props.diffusion_energy_1 = values[7];
                props.diffusion_energy_2 = values[8];
                props.jump_length = values[9];
                props.b0 = values[10];
                props.aromaticity = values[11];
            }
        }

        if let Some(table) = self.table(REACTIONS_TABLE) {
            for row in &table.rows {
                let Some((mother, products)) = row.fields.split_first() else {
                    return Err(table.malformed(row));
                };
                if products.is_empty() {
                    return Err(table.malformed(row));
                }
                model.add_reaction(Reaction::new(mother, products.to_vec()))?;
            }
        }

        if let Some(table) = self.table(REACTION_RATIOS_TABLE) {
            for row in &table.rows {
                let [mother, product_1, product_2, expression] = row.fields.as_slice() else {
                    return Err(table.malformed(row));
                };
                let parsed = RatioExpression::parse(expression).map_err(|message| ConfigError::RatioExpression {
                    mother: mother.clone(),
                    expression: expression.clone(),
                    message,
                })?;
                let reaction = model.reaction_mut(mother).ok_or_else(|| ConfigError::UnknownSpecies {
                    species: mother.clone(),
                    context: "reaction ratios (no reaction defined)".to_string(),
                })?;
                reaction.add_ratio(ReactionRatio {
                    product_1: product_1.clone(),
                    product_2: product_2.clone(),
                    expression: parsed,
                })?;
            }
        }

        debug!(
            "chemical model with {} elements, {} species, {} reactions",
            model.elements().len(),
            model.number_of_species(),
            model.reactions().len()
        );
        Ok(model)
    }
}

fn cache() -> std::sync::MutexGuard<'static, HashMap<PathBuf, Arc<GenexConfig>>> {
    CONFIG_CACHE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn table_name(line: &str) -> Option<&str> {
    let rest = &line[line.find(TABLE_PREFIX)? + TABLE_PREFIX.len()..];
    rest.find(']').map(|end| rest[..end].trim())
}

fn split_fields(line: &str) -> Vec<String> {
    let mut fields: Vec<String> = line.split(',').map(|f| f.trim().to_string()).collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}
