/// Collapses the page's noisy text into single-spaced, ASCII-folded form.
///
/// Zero-width characters and BOMs are dropped; full-width ASCII variants
/// (common in the Chinese version of the page) and the ideographic space
/// are folded to their half-width forms.
pub(crate) fn normalize_text(value: &str) -> String {
    let folded: String = value
        .chars()
        .filter(|c| !matches!(c, '\u{feff}' | '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{2060}'))
        .map(fold_width)
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-folded key with punctuation removed, used to spot the same
/// applicant written slightly differently.
pub(crate) fn name_key(value: &str) -> String {
    normalize_text(value)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn fold_width(c: char) -> char {
    match c {
        '\u{3000}' | '\u{00a0}' => ' ',
        '\u{ff01}'..='\u{ff5e}' => char::from_u32(c as u32 - 0xfee0).unwrap_or(c),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_invisible_characters() {
        let source = "\u{feff}  ABC\u{200b} Holdings\n\t Limited\u{00a0} ";
        assert_eq!(normalize_text(source), "ABC Holdings Limited");
    }

    #[test]
    fn folds_full_width_forms() {
        assert_eq!(normalize_text("申請人：ＡＢＣ\u{3000}（集團）"), "申請人:ABC (集團)");
        assert_eq!(normalize_text("１５/１０/２０２６"), "15/10/2026");
    }

    #[test]
    fn name_key_ignores_case_and_punctuation() {
        assert_eq!(name_key("ABC Holdings Ltd."), name_key("abc holdings  LTD"));
        assert_ne!(name_key("ABC Holdings Ltd."), name_key("ABD Holdings Ltd."));
        assert_eq!(name_key("（甲乙）科技有限公司"), "甲乙科技有限公司");
    }
}
