use evalexpr::{ContextWithMutableVariables, HashMapContext, Node, Value, build_operator_tree};

const AROMATICITY_NAMES: [&str; 3] = ["Arom", "arom", "Aromaticity"];

/// Arithmetic expression in the preasphaltene aromaticity, e.g. `1.5*Arom+0.2`.
///
/// Integer literals are read as floats, so `1/2` is 0.5.
#[derive(Debug, Clone)]
pub struct RatioExpression {
    source: String,
    tree: Node,
}

impl PartialEq for RatioExpression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl RatioExpression {
    pub fn parse(text: &str) -> Result<Self, String> {
        let tree = build_operator_tree(&float_literals(text)).map_err(|e| e.to_string())?;
        if let Some(name) = tree
            .iter_variable_identifiers()
            .find(|name| !AROMATICITY_NAMES.contains(name))
        {
            return Err(format!("unknown variable '{}'", name));
        }
        let expression = Self {
            source: text.trim().to_string(),
            tree,
        };
        expression.evaluate(0.5)?;
        Ok(expression)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, aromaticity: f64) -> Result<f64, String> {
        let mut context = HashMapContext::new();
        for name in AROMATICITY_NAMES {
            context
                .set_value(name.to_string(), Value::Float(aromaticity))
                .map_err(|e| e.to_string())?;
        }
        self.tree
            .eval_number_with_context(&context)
            .map_err(|e| e.to_string())
    }
}

/// Rewrites `2*(1-Arom)` as `2.0*(1.0-Arom)`; identifiers such as `C15` are left alone.
fn float_literals(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                out.push(chars[i]);
                i += 1;
            }
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let mut float = chars[start..i].contains(&'.');
            if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                float = true;
                i += 1;
                if i < chars.len() && matches!(chars[i], '+' | '-') {
                    i += 1;
                }
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            out.extend(&chars[start..i]);
            if !float {
                out.push_str(".0");
            }
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}
