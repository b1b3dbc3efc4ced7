/// Split a space-delimited scope parameter, dropping empty entries and duplicates.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    let mut scopes: Vec<String> = Vec::new();
    for scope in raw.split_whitespace() {
        if !scopes.iter().any(|s| s == scope) {
            scopes.push(scope.to_string());
        }
    }
    scopes
}

/// Join scopes with a single space, keeping their order.
pub fn join_scopes<S: AsRef<str>>(scopes: &[S]) -> String {
    scopes
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join(" ")
}
