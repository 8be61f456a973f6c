pub fn escape_field(col: &str) -> String {
    // Escape single quote, double quote, period, and brackets with a backslash
    col.replace('\'', "\\'")
        .replace('\"', "\\\"")
        .replace('.', "\\.")
        .replace('[', "\\[")
        .replace(']', "\\]")
}

pub fn unescape_field(col: &str) -> String {
    // Unescape single quote, double quote, period, and brackets
    col.replace("\\'", "'")
        .replace("\\\"", "\"")
        .replace("\\.", ".")
        .replace("\\[", "[")
        .replace("\\]", "]")
}

/// Expression that reads a flat (escaped) field from the current datum, e.g. `datum["a.b"]`
pub fn datum_accessor(field: &str) -> String {
    let key = unescape_field(field);
    // serde_json string quoting is also a valid expression string literal
    let quoted = serde_json::Value::String(key).to_string();
    format!("datum[{quoted}]")
}

#[cfg(test)]
mod tests {
    use crate::escape::{datum_accessor, escape_field, unescape_field};

    #[test]
    fn test_escape() {
        let col = "'foo'_._\"bar\"";
        let escaped = escape_field(col);
        assert_eq!(escaped, r#"\'foo\'_\._\"bar\""#)
    }

    #[test]
    fn test_unescape() {
        let col = r#"\'foo\'_\._\"bar\""#;
        let unescaped = unescape_field(col);
        assert_eq!(unescaped, "'foo'_._\"bar\"")
    }

    #[test]
    fn test_datum_accessor() {
        assert_eq!(datum_accessor("day"), r#"datum["day"]"#);
        assert_eq!(datum_accessor(r"a\.b"), r#"datum["a.b"]"#);
        assert_eq!(datum_accessor(r#"say \"hi\""#), r#"datum["say \"hi\""]"#);
    }
}
