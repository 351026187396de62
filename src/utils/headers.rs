//! Fuzzy matching of free-text spreadsheet headers

use regex::Regex;
use serde_json::Value;

use crate::types::Record;

/// Find the first header matching every pattern in `all`
pub fn find_header<'a>(headers: &'a [String], all: &[&Regex]) -> Option<&'a str> {
    headers
        .iter()
        .map(String::as_str)
        .find(|header| all.iter().all(|pattern| pattern.is_match(header)))
}

/// Try each candidate pattern in turn, most specific first
pub fn find_header_by_candidates<'a>(headers: &'a [String], candidates: &[Regex]) -> Option<&'a str> {
    candidates
        .iter()
        .find_map(|pattern| find_header(headers, &[pattern]))
}

/// Look up a record value whose key matches `pattern`
pub fn find_value<'a>(record: &'a Record, pattern: &Regex) -> Option<&'a Value> {
    record
        .iter()
        .find(|(key, _)| pattern.is_match(key))
        .map(|(_, value)| value)
}

/// Look up a record entry by key, ignoring case and surrounding blanks.
/// Aliases are tried in order and an exact key wins over a loose one.
pub fn get_ignore_case<'a>(record: &'a Record, aliases: &[String]) -> Option<(&'a str, &'a Value)> {
    aliases.iter().find_map(|alias| {
        record
            .iter()
            .find(|(key, _)| key.as_str() == alias.as_str())
            .or_else(|| {
                let wanted = alias.trim();
                record.iter().find(|(key, _)| key.trim().eq_ignore_ascii_case(wanted))
            })
            .map(|(key, value)| (key.as_str(), value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_header_requires_all_patterns() {
        let integrated = Regex::new("(?i)integrated").unwrap();
        let main = Regex::new(r"(?i)tax\s*amount").unwrap();
        let hs = headers(&["Integrated Tax(Rate)", "Integrated Tax(Tax Amount)"]);
        assert_eq!(
            find_header(&hs, &[&integrated, &main]),
            Some("Integrated Tax(Tax Amount)")
        );
        assert_eq!(find_header(&hs, &[&main, &Regex::new("cess").unwrap()]), None);
    }

    #[test]
    fn test_candidates_prefer_earlier_patterns() {
        let candidates = vec![
            Regex::new(r"(?i)^\s*note\s*type\s*$").unwrap(),
            Regex::new(r"(?i)type").unwrap(),
        ];
        let hs = headers(&["Supply Type", "Note type"]);
        assert_eq!(find_header_by_candidates(&hs, &candidates), Some("Note type"));
    }

    #[test]
    fn test_get_ignore_case() {
        let record = json!({"  gstin ": "29AAA", "Other": 1});
        let record = record.as_object().unwrap();
        let found = get_ignore_case(record, &["GSTIN".to_string()]);
        assert_eq!(found, Some(("  gstin ", &json!("29AAA"))));
        assert_eq!(get_ignore_case(record, &["other".to_string()]).map(|(k, _)| k), Some("Other"));
    }
}
