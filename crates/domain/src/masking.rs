/// Token substituted with the last four characters of the raw value.
const LAST4_TOKEN: &str = "{{last4}}";
/// Token substituted with the first four characters of the raw value.
const FIRST4_TOKEN: &str = "{{first4}}";

/// Masks a field value for display.
///
/// With a pattern containing `{{last4}}` or `{{first4}}`, the token is
/// replaced with the corresponding slice of the raw value; a pattern with no
/// recognized token is returned verbatim as a fixed replacement. Without a
/// pattern, values of up to two characters become all asterisks, longer
/// values keep their first and last character with asterisks between.
///
/// Operates on `char` boundaries, never raw bytes.
#[must_use]
pub fn mask_field_value(value: &str, pattern: Option<&str>) -> String {
    if let Some(pattern) = pattern {
        if pattern.contains(LAST4_TOKEN) {
            return pattern.replace(LAST4_TOKEN, tail_chars(value, 4).as_str());
        }

        if pattern.contains(FIRST4_TOKEN) {
            return pattern.replace(FIRST4_TOKEN, head_chars(value, 4).as_str());
        }

        return pattern.to_owned();
    }

    let characters: Vec<char> = value.chars().collect();
    if characters.len() <= 2 {
        return "*".repeat(characters.len());
    }

    let mut masked = String::with_capacity(value.len());
    masked.push(characters[0]);
    masked.extend(std::iter::repeat_n('*', characters.len() - 2));
    masked.push(characters[characters.len() - 1]);
    masked
}

fn tail_chars(value: &str, count: usize) -> String {
    let length = value.chars().count();
    value.chars().skip(length.saturating_sub(count)).collect()
}

fn head_chars(value: &str, count: usize) -> String {
    value.chars().take(count).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::mask_field_value;

    #[test]
    fn last4_token_is_substituted() {
        assert_eq!(
            mask_field_value("1234567890", Some("{{last4}}XXX")),
            "7890XXX"
        );
    }

    #[test]
    fn first4_token_is_substituted() {
        assert_eq!(
            mask_field_value("1234567890", Some("XXX-{{first4}}")),
            "XXX-1234"
        );
    }

    #[test]
    fn tokenless_pattern_is_a_fixed_replacement() {
        assert_eq!(mask_field_value("secret", Some("hidden")), "hidden");
    }

    #[test]
    fn short_values_become_all_asterisks() {
        assert_eq!(mask_field_value("ab", None), "**");
        assert_eq!(mask_field_value("a", None), "*");
        assert_eq!(mask_field_value("", None), "");
    }

    #[test]
    fn default_mask_keeps_first_and_last_character() {
        assert_eq!(mask_field_value("secret", None), "s****t");
    }

    #[test]
    fn token_slices_respect_char_boundaries() {
        assert_eq!(mask_field_value("héllo", None), "h***o");
        assert_eq!(mask_field_value("ü", None), "*");
    }

    proptest! {
        #[test]
        fn default_mask_preserves_char_length(value in ".{0,64}") {
            let masked = mask_field_value(value.as_str(), None);
            prop_assert_eq!(masked.chars().count(), value.chars().count());
        }
    }
}
