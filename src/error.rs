use thiserror::Error;

/// Problems found while reading or preprocessing a chemical network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("element '{0}' is defined more than once")]
    DuplicateElement(String),

    #[error("species '{0}' is defined more than once")]
    DuplicateSpecies(String),

    #[error("species '{mother}' already has a reaction")]
    DuplicateReaction { mother: String },

    #[error("unknown element '{element}' referenced by {context}")]
    UnknownElement { element: String, context: String },

    #[error("unknown species '{species}' referenced by {context}")]
    UnknownSpecies { species: String, context: String },

    #[error("malformed row {line} in table {table}: '{row}'")]
    MalformedRow { table: String, line: usize, row: String },

    #[error("invalid number '{value}' in table {table}")]
    InvalidNumber { table: String, value: String },

    #[error("invalid boolean '{value}' for {key}; expected TRUE or FALSE")]
    InvalidBoolean { key: String, value: String },

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("invalid ratio expression '{expression}' for {mother}: {message}")]
    RatioExpression { mother: String, expression: String, message: String },

    #[error("reaction of {mother} has {products} products but {equations} independent equations")]
    UnsolvableReaction { mother: String, products: usize, equations: usize },

    #[error("reaction of {mother} has a singular stoichiometric system")]
    SingularReaction { mother: String },

    #[error("non-positive mass factor {factor} for {mother} -> {product}")]
    NonPositiveMassFactor { mother: String, product: String, factor: f64 },

    #[error("could not parse parameters: {0}")]
    Parameters(String),
}

/// Violations of the per-node step ordering contract.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SequencingError {
    #[error("source rock node ({i}, {j}) is already initialized")]
    AlreadyInitialized { i: usize, j: usize },

    #[error("source rock node has not been initialized")]
    NotInitialized,

    #[error("step out of order: state is at {expected} Ma, input starts at {found} Ma")]
    OutOfOrder { expected: f64, found: f64 },

    #[error("step to {time} Ma reverses the time direction from {reference} Ma")]
    WrongDirection { reference: f64, time: f64 },

    #[error("step to {time} Ma does not advance the simulation")]
    NonAdvancingStep { time: f64 },
}

#[derive(Error, Debug)]
pub enum GenexError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("species '{0}' is missing from the chemical model")]
    MissingSpecies(String),

    #[error("sequencing error: {0}")]
    Sequencing(#[from] SequencingError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GenexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_convert_into_genex_error() {
        let err: GenexError = SequencingError::NotInitialized.into();
        assert!(matches!(err, GenexError::Sequencing(SequencingError::NotInitialized)));

        let err: GenexError = ConfigError::DuplicateSpecies("C1".to_string()).into();
        assert_eq!(
            err.to_string(),
            "configuration error: species 'C1' is defined more than once"
        );
    }
}
