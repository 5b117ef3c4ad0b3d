// src/format_utils.rs - fixed-width number formatting for history tables

/// Formats like a C++ stream with default flags: `%g` with 6 significant digits.
pub fn format_g(value: f64) -> String {
    format_g_precision(value, 6)
}

pub fn format_g_precision(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    // rounding to the requested digits may carry into the next decade
    let scientific = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Right-aligned `%g` value in a column of `width` characters.
pub fn column(value: f64, width: usize) -> String {
    format!("{:>width$}", format_g(value), width = width)
}

/// Right-aligned header text in a column of `width` characters.
pub fn header(name: &str, width: usize) -> String {
    format!("{:>width$}", name, width = width)
}
