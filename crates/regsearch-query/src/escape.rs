/// Escapes a value for use inside a double-quoted clause.
pub fn escape_quoted(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	for ch in value.chars() {
		if ch == '"' || ch == '\\' { out.push('\\'); }
		out.push(ch);
	}
	out
}

/// Trims input and drops wildcards the user typed at the end; the builder
/// appends its own.
pub fn normalize_input(value: &str) -> &str { value.trim().trim_end_matches('*').trim_end() }

pub fn is_numeric(value: &str) -> bool { !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) }

pub fn is_year(value: &str) -> bool { value.len() == 4 && is_numeric(value) }

/// Bare field paths only (`[A-Za-z0-9_.]+`); anything else could alter the query.
pub fn is_field_name(value: &str) -> bool {
	!value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}
