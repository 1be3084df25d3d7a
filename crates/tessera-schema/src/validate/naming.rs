use crate::MAX_IDENT_LEN;

/// Ensure an identifier is non-empty, ASCII, within the maximum length and
/// shaped like `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn validate_ident(ident: &str) -> Result<(), String> {
    if ident.is_empty() {
        return Err("ident is empty".to_string());
    }
    if ident.len() > MAX_IDENT_LEN {
        return Err(format!("ident '{ident}' exceeds max length {MAX_IDENT_LEN}"));
    }
    if !ident.is_ascii() {
        return Err(format!("ident '{ident}' must be ASCII"));
    }

    let mut chars = ident.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("ident '{ident}' contains invalid characters"));
    }

    Ok(())
}

/// Namespaces are one or more identifiers joined by `.`.
pub(crate) fn validate_namespace(namespace: &str) -> Result<(), String> {
    if namespace.is_empty() {
        return Err("namespace is empty".to_string());
    }

    for segment in namespace.split('.') {
        validate_ident(segment).map_err(|e| format!("namespace '{namespace}': {e}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_malformed_idents() {
        assert!(validate_ident("").is_err(), "empty identifiers should fail");
        assert!(validate_ident("9lives").is_err());
        assert!(validate_ident("$class").is_err(), "system names are reserved");
        assert!(validate_ident(&"a".repeat(MAX_IDENT_LEN + 1)).is_err());
    }

    #[test]
    fn accepts_plain_identifiers() {
        assert!(validate_ident("vin").is_ok());
        assert!(validate_ident("_internal2").is_ok());
    }

    #[test]
    fn namespaces_are_dotted_idents() {
        assert!(validate_namespace("org.acme").is_ok());
        assert!(validate_namespace("org..acme").is_err());
        assert!(validate_namespace("org.acme.").is_err());
    }
}
