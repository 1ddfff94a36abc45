use chrono::{DateTime, Local, NaiveDate};

/// Length of a fully masked CPF: `XXX.XXX.XXX-XX`
pub const CPF_MASKED_LENGTH: usize = 14;

/// Number of digits in a CPF
const CPF_DIGITS: usize = 11;

/// Apply the CPF mask to whatever the user has typed so far.
/// Non-digits are dropped and extra digits beyond eleven are cut off,
/// so partial input formats progressively: `1234` -> `123.4`.
pub fn format_cpf(input: &str) -> String {
    let digits: String = input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(CPF_DIGITS)
        .collect();

    let mut formatted = String::with_capacity(CPF_MASKED_LENGTH);
    for (i, c) in digits.chars().enumerate() {
        match i {
            3 | 6 => formatted.push('.'),
            9 => formatted.push('-'),
            _ => {}
        }
        formatted.push(c);
    }
    formatted
}

/// Check that a CPF is in the masked `ddd.ddd.ddd-dd` form.
/// Only the shape is checked, not the verifier digits.
pub fn is_valid_cpf_format(cpf: &str) -> bool {
    if cpf.len() != CPF_MASKED_LENGTH {
        return false;
    }
    cpf.chars().enumerate().all(|(i, c)| match i {
        3 | 7 => c == '.',
        11 => c == '-',
        _ => c.is_ascii_digit(),
    })
}

/// Format an amount as Brazilian reais: `R$ 1234,50`.
/// No thousands separator, matching what the bank app shows.
pub fn format_currency(value: f64) -> String {
    format!("R$ {}", format!("{:.2}", value).replace('.', ","))
}

/// Format an API timestamp as `dd/mm/yyyy` in the local timezone.
/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates; anything else
/// is returned unchanged.
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        dt.with_timezone(&Local).format("%d/%m/%Y").to_string()
    } else if let Some(day) = date.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()) {
        day.format("%d/%m/%Y").to_string()
    } else {
        date.to_string()
    }
}

/// First character of a name, for avatar-style initials
pub fn initial(name: &str) -> String {
    name.chars().next().map(|c| c.to_uppercase().to_string()).unwrap_or_default()
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
