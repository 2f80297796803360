//! Default diacritics equivalence classes.
//!
//! Each entry pairs a lowercase class with its uppercase counterpart; every
//! character in a class matches every other one when diacritics equivalence
//! is enabled. The table is configuration data: callers can replace it
//! through `MarkConfig::diacritics_table` when the built-in (Latin-script)
//! policy does not fit their locale.

/// Built-in equivalence classes as (lowercase, uppercase) pairs.
pub const DEFAULT_DIACRITICS: &[(&str, &str)] = &[
    ("aàáảãạăằắẳẵặâầấẩẫậäåāą", "AÀÁẢÃẠĂẰẮẲẴẶÂẦẤẨẪẬÄÅĀĄ"),
    ("cçćč", "CÇĆČ"),
    ("dđď", "DĐĎ"),
    ("eèéẻẽẹêềếểễệëěēę", "EÈÉẺẼẸÊỀẾỂỄỆËĚĒĘ"),
    ("iìíỉĩịîïī", "IÌÍỈĨỊÎÏĪ"),
    ("lł", "LŁ"),
    ("nñňń", "NÑŇŃ"),
    ("oòóỏõọôồốổỗộơởỡớờợöøō", "OÒÓỎÕỌÔỒỐỔỖỘƠỞỠỚỜỢÖØŌ"),
    ("rř", "RŘ"),
    ("sšśșş", "SŠŚȘŞ"),
    ("tťțţ", "TŤȚŢ"),
    ("uùúủũụưừứửữựûüůū", "UÙÚỦŨỤƯỪỨỬỮỰÛÜŮŪ"),
    ("yýỳỷỹỵÿ", "YÝỲỶỸỴŸ"),
    ("zžżź", "ZŽŻŹ"),
];

/// The effective table as owned pairs, honoring a caller override.
pub fn default_diacritics_table(
    custom: Option<&Vec<(String, String)>>,
) -> Vec<(String, String)> {
    match custom {
        Some(table) => table.clone(),
        None => DEFAULT_DIACRITICS
            .iter()
            .map(|(lo, up)| (lo.to_string(), up.to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes_are_case_paired() {
        for (lo, up) in DEFAULT_DIACRITICS {
            assert_eq!(lo.chars().count(), up.chars().count());
            assert!(lo.starts_with(|c: char| c.is_ascii_lowercase()));
            assert!(up.starts_with(|c: char| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_classes_are_disjoint() {
        let mut seen = std::collections::HashSet::new();
        for (lo, up) in DEFAULT_DIACRITICS {
            for c in lo.chars().chain(up.chars()) {
                assert!(seen.insert(c), "character {c:?} appears in two classes");
            }
        }
    }

    #[test]
    fn test_custom_override() {
        let custom = vec![("ae".to_string(), "AE".to_string())];
        let table = default_diacritics_table(Some(&custom));
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].0, "ae");
    }
}
