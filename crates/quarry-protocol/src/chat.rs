//! Text components and legacy colour codes.

use quarry_nbt::{Compound, Tag};

const SECTION_SIGN: char = '\u{a7}';

/// Replaces `&x` colour and format codes with `§x`. Other ampersands are kept.
pub fn translate_color_codes(text: &str) -> String {
    let mut translated = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('&', Some(&code)) if is_format_code(code) => translated.push(SECTION_SIGN),
            _ => translated.push(c),
        }
    }
    translated
}

fn is_format_code(code: char) -> bool {
    matches!(code.to_ascii_lowercase(), '0'..='9' | 'a'..='f' | 'k'..='o' | 'r')
}

/// A plain text component, as sent in the network tree form.
pub fn text_component(text: &str) -> Tag {
    Compound::new()
        .with("text", Tag::String(translate_color_codes(text)))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_color_codes() {
        assert_eq!(translate_color_codes("&aGreen &lbold"), "§aGreen §lbold");
        assert_eq!(translate_color_codes("&Rreset"), "§Rreset");
        assert_eq!(translate_color_codes("fish & chips"), "fish & chips");
        assert_eq!(translate_color_codes("&zno"), "&zno");
        assert_eq!(translate_color_codes("trailing &"), "trailing &");
    }

    #[test]
    fn test_text_component() {
        let tag = text_component("&cHi");
        let compound = tag.as_compound().unwrap();
        assert_eq!(compound.get("text").and_then(Tag::as_str), Some("§cHi"));
        assert_eq!(compound.len(), 1);
    }
}
