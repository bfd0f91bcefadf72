/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Partially hides an email address for display in diagnostics, e.g. `shop@example.com` becomes `sh***@example.com`.
///
/// Values without an `@` are masked entirely. Empty values are reported as `not configured`.
pub fn mask_email(email: &str) -> String {
    let email = email.trim();
    if email.is_empty() {
        return "not configured".to_string();
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible = local.chars().take(2).collect::<String>();
            format!("{visible}***@{domain}")
        },
        None => "***".to_string(),
    }
}
