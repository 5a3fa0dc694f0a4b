/// Identifier quoting for the target SQL dialect.
///
/// Legacy source tables carry column names like `5g_ready`, `drive-test.score`
/// and `cluster name`; those must be double-quoted to stay valid identifiers.
/// Everything else is left bare so ordinary statements read normally.
pub fn needs_quoting(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_digit())
        || name.contains('-')
        || name.contains('.')
        || name.contains(' ')
}

pub fn quote_ident(name: &str) -> String {
    if needs_quoting(name) {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn irregular_identifiers_are_quoted() {
        assert_eq!(quote_ident("5g_ready"), "\"5g_ready\"");
        assert_eq!(quote_ident("drive-test"), "\"drive-test\"");
        assert_eq!(quote_ident("kpi.score"), "\"kpi.score\"");
        assert_eq!(quote_ident("cluster name"), "\"cluster name\"");
    }

    #[test]
    fn regular_identifiers_stay_bare() {
        assert_eq!(quote_ident("site_id"), "site_id");
        assert_eq!(quote_ident("status2"), "status2");
        assert_eq!(quote_ident("_internal"), "_internal");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(quote_ident("odd\"col "), "\"odd\"\"col \"");
    }
}
