use anyhow::anyhow;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    EnUs,
    EsVe,
}

impl Locale {
    fn separators(&self) -> (char, char) {
        match self {
            Locale::EnUs => (',', '.'),
            Locale::EsVe => ('.', ','),
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Locale::EnUs => "en-US",
                Locale::EsVe => "es-VE",
            }
        )
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "en-us" | "en" => Ok(Locale::EnUs),
            "es-ve" | "es" => Ok(Locale::EsVe),
            _ => Err(anyhow!("Unsupported locale: {}", s)),
        }
    }
}

/// Formats `value` with exactly two fraction digits and the locale's digit grouping.
pub fn format_amount(value: f64, locale: Locale) -> String {
    let (group_sep, decimal_sep) = locale.separators();
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(group_sep);
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    format!(
        "{}{grouped}{decimal_sep}{frac_part}",
        if negative { "-" } else { "" }
    )
}

/// Amount followed by its currency code, e.g. `43,48 VES`.
pub fn format_money(value: f64, currency: &str, locale: Locale) -> String {
    format!("{} {}", format_amount(value, locale), currency)
}
