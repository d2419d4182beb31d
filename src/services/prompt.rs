use crate::models::style::Style;

/// Longest stem kept from a word when naming its image file.
const MAX_STEM_LEN: usize = 64;

/// Compose the generation prompt for one word.
pub fn build_prompt(word: &str, style: Style, background: &str) -> String {
    let background = background.trim();
    let background = if background.is_empty() { "white" } else { background };
    format!(
        "{} of \"{}\", centered on a plain {} background, single subject, no text or lettering",
        capitalize(style.descriptor()),
        word.trim(),
        background
    )
}

/// Reduce a word to `[a-z0-9_]`, collapsing everything else into single underscores.
pub fn sanitize_filename(word: &str) -> String {
    let mut stem = String::with_capacity(word.len());
    let mut pending_sep = false;
    for ch in word.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !stem.is_empty() {
                stem.push('_');
            }
            pending_sep = false;
            stem.push(ch);
        } else {
            pending_sep = true;
        }
        if stem.len() >= MAX_STEM_LEN {
            break;
        }
    }
    if stem.is_empty() {
        "image".to_string()
    } else {
        stem
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
