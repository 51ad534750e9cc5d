use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Script {
    Latin,
    Greek,
    Cyrillic,
    Hebrew,
    Arabic,
    Devanagari,
    Thai,
    Hangul,
    Kana,
    Han,
    Other,
}

/// Which ElevenLabs model family a piece of text needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSelection {
    Monolingual,
    Multilingual,
}

pub fn script_of(c: char) -> Option<Script> {
    if !c.is_alphabetic() {
        return None;
    }
    let script = match c as u32 {
        0x0041..=0x024F | 0x1E00..=0x1EFF => Script::Latin,
        0x0370..=0x03FF | 0x1F00..=0x1FFF => Script::Greek,
        0x0400..=0x052F => Script::Cyrillic,
        0x0590..=0x05FF => Script::Hebrew,
        0x0600..=0x06FF | 0x0750..=0x077F => Script::Arabic,
        0x0900..=0x097F => Script::Devanagari,
        0x0E00..=0x0E7F => Script::Thai,
        0x1100..=0x11FF | 0xAC00..=0xD7AF => Script::Hangul,
        0x3040..=0x30FF => Script::Kana,
        0x4E00..=0x9FFF | 0x3400..=0x4DBF => Script::Han,
        _ => Script::Other,
    };
    Some(script)
}

pub fn detect_scripts(text: &str) -> BTreeSet<Script> {
    text.chars().filter_map(script_of).collect()
}

/// Plain ASCII text stays on the monolingual model. Any non-ASCII letter
/// (accented Latin included) or more than one script selects the
/// multilingual model.
pub fn classify_text(text: &str) -> ModelSelection {
    let non_ascii_letter = text.chars().any(|c| !c.is_ascii() && c.is_alphabetic());
    if non_ascii_letter || detect_scripts(text).len() > 1 {
        ModelSelection::Multilingual
    } else {
        ModelSelection::Monolingual
    }
}
