// ============================================================================
// CSV Export / Import
// ============================================================================
//
// Every value is wrapped in double quotes and joined with commas. Embedded
// quotes are not escaped; the reader only honours quotes as field delimiters.
//
// ============================================================================

pub mod orders_csv;
pub mod products_csv;

fn quoted_line<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| format!("\"{}\"", v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Split a line on commas that are outside double quotes, dropping the quotes
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.trim_end_matches(['\r', '\n']).chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields.into_iter().map(|f| f.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_quoted_commas() {
        let fields = split_line("\"Sato, whole\",\"TLP-1\",12000,\"\"");
        assert_eq!(fields, vec!["Sato, whole", "TLP-1", "12000", ""]);
    }

    #[test]
    fn test_quoted_line() {
        assert_eq!(quoted_line(["a", "b c"]), "\"a\",\"b c\"");
    }
}
