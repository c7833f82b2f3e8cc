//! Story-template scanning.
//!
//! Templates carry placeholder tokens of the form `__N__` (N a
//! non-negative decimal integer). A single tokenizer pass is the one
//! authoritative source of required slots; callers never re-derive them
//! with ad hoc string searches.

/// One piece of a tokenized template, in textual order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    /// Literal story text, byte-for-byte as written.
    Literal(String),
    /// A fill-in slot carrying its slot index.
    Placeholder(u32),
}

/// Tokenizes a template into literal and placeholder segments.
///
/// Every literal character is preserved and placeholders are visited in
/// textual order, duplicates included. A malformed token (`__x__`, an
/// unterminated `__12`, or a number too large for `u32`) stays literal.
#[must_use]
pub fn parse_segments(template: &str) -> Vec<TemplateSegment> {
    let bytes = template.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'_' && bytes.get(i + 1) == Some(&b'_') {
            let digit_start = i + 2;
            let mut j = digit_start;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            let closed = j > digit_start
                && bytes.get(j) == Some(&b'_')
                && bytes.get(j + 1) == Some(&b'_');
            if closed {
                if let Ok(slot) = template[digit_start..j].parse::<u32>() {
                    if literal_start < i {
                        segments.push(TemplateSegment::Literal(
                            template[literal_start..i].to_owned(),
                        ));
                    }
                    segments.push(TemplateSegment::Placeholder(slot));
                    i = j + 2;
                    literal_start = i;
                    continue;
                }
            }
        }
        i += 1;
    }

    if literal_start < template.len() {
        segments.push(TemplateSegment::Literal(template[literal_start..].to_owned()));
    }
    segments
}

/// Derives the required slot indices for a template: deduplicated and
/// sorted ascending. Purely a function of the template text.
#[must_use]
pub fn required_slots(template: &str) -> Vec<u32> {
    let mut slots: Vec<u32> = parse_segments(template)
        .into_iter()
        .filter_map(|segment| match segment {
            TemplateSegment::Placeholder(slot) => Some(slot),
            TemplateSegment::Literal(_) => None,
        })
        .collect();
    slots.sort_unstable();
    slots.dedup();
    slots
}
