//! URL-safe identifiers derived from display names.

/// Turn a display name into a URL-safe slug.
///
/// The text is lower-cased, anything that is not an ASCII word character,
/// whitespace or a hyphen is dropped, runs of whitespace/underscores/hyphens
/// collapse into a single hyphen, and hyphens at either end are trimmed.
/// `"Great Blue Heron!!"` becomes `"great-blue-heron"`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_separator = true;
        }
        // Everything else is stripped without acting as a separator, so
        // "O'Brien" stays "obrien" rather than "o-brien".
    }

    slug
}

/// Whether `candidate` already satisfies the slug shape.
pub fn is_url_safe(candidate: &str) -> bool {
    !candidate.is_empty()
        && !candidate.starts_with('-')
        && !candidate.ends_with('-')
        && candidate
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_joins_words() {
        assert_eq!(slugify("Great Blue Heron!!"), "great-blue-heron");
        assert_eq!(slugify("Snowy Owl"), "snowy-owl");
    }

    #[test]
    fn collapses_mixed_separators() {
        assert_eq!(slugify("  Red__tailed -- Hawk  "), "red-tailed-hawk");
        assert_eq!(slugify("---Kea---"), "kea");
    }

    #[test]
    fn drops_characters_without_splitting_words() {
        assert_eq!(slugify("Leach's Storm-Petrel"), "leachs-storm-petrel");
        assert_eq!(slugify("Guacamaya Roja (Ara macao)"), "guacamaya-roja-ara-macao");
    }

    #[test]
    fn non_ascii_letters_are_removed() {
        assert_eq!(slugify("Colibrí Esmeralda"), "colibr-esmeralda");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn derived_slugs_are_url_safe() {
        for name in [
            "Great Blue Heron!!",
            "Bald Eagle",
            "  Scarlet   Macaw ",
            "Blue-footed Booby #2",
            "Ñandú común",
        ] {
            let slug = slugify(name);
            assert!(is_url_safe(&slug), "{name:?} produced {slug:?}");
        }
    }

    #[test]
    fn url_safety_rejects_bad_shapes() {
        assert!(!is_url_safe(""));
        assert!(!is_url_safe("-heron"));
        assert!(!is_url_safe("heron-"));
        assert!(!is_url_safe("Heron"));
        assert!(is_url_safe("heron-2"));
    }
}
