//! Human labels for machine category codes.

/// Fallback label for a missing or empty category code.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Turn an underscore-separated lowercase category code into a display
/// label with each word capitalised ("tugas_praktikum" becomes
/// "Tugas Praktikum"). `None` or an empty code yields [`UNKNOWN_LABEL`].
///
/// Pure and total: there is no failure mode for malformed input.
pub fn format_label(code: Option<&str>) -> String {
    let code = match code {
        Some(code) if !code.is_empty() => code,
        _ => return UNKNOWN_LABEL.to_string(),
    };
    code.split('_')
        .map(capitalise)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
