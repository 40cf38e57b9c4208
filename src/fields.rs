//! Value objects for list-shaped fields that forms edit as plain text.

use std::fmt;

/// An ordered list of short free-text entries (bird tags, species spotted on
/// an outing). Forms edit it as a single comma-separated string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextList(Vec<String>);

impl TextList {
    /// Split a comma-separated string, trimming every entry and dropping the
    /// empty ones.
    pub fn parse(input: &str) -> Self {
        Self(
            input
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The entry currently being typed, i.e. the text after the last comma.
    pub fn trailing_fragment(input: &str) -> &str {
        match input.rfind(',') {
            Some(idx) => input[idx + 1..].trim_start(),
            None => input.trim_start(),
        }
    }
}

impl From<Vec<String>> for TextList {
    fn from(entries: Vec<String>) -> Self {
        Self(entries)
    }
}

impl From<&[String]> for TextList {
    fn from(entries: &[String]) -> Self {
        Self(entries.to_vec())
    }
}

impl fmt::Display for TextList {
    /// Serialize back into the form representation, `"a, b, c"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_skips_blanks() {
        let list = TextList::parse(" Raptor,Migration , , Rare ,");
        assert_eq!(list.as_slice(), ["Raptor", "Migration", "Rare"]);
        assert!(TextList::parse("   ").is_empty());
    }

    #[test]
    fn serialize_then_parse_preserves_entries() {
        let list = TextList::from(vec!["Great Egret".to_string(), "Osprey".to_string()]);
        let text = list.to_string();
        assert_eq!(text, "Great Egret, Osprey");
        assert_eq!(TextList::parse(&text), list);
    }

    #[test]
    fn trailing_fragment_tracks_last_entry() {
        assert_eq!(TextList::trailing_fragment("Osprey, Gre"), "Gre");
        assert_eq!(TextList::trailing_fragment("Osp"), "Osp");
        assert_eq!(TextList::trailing_fragment("Osprey,"), "");
    }
}
