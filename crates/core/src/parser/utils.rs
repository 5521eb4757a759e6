use crate::types::TextRange;
use tree_sitter::Node;

pub fn node_range(node: &Node) -> TextRange {
    TextRange::new(node.start_byte(), node.end_byte())
}

pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Offset of the first byte of the line containing `offset`
pub fn line_start(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Offset of the `\n` ending the line containing `offset`, or the text length
pub fn line_end(text: &str, offset: usize) -> usize {
    let offset = offset.min(text.len());
    text[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(text.len())
}

/// Leading whitespace of the line containing `offset`
pub fn indentation(text: &str, offset: usize) -> &str {
    let start = line_start(text, offset);
    let line = &text[start..line_end(text, start)];
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// Grow `range` to whole lines when nothing but whitespace shares them,
/// so deleting it does not leave a blank line behind.
pub fn line_extended_range(text: &str, range: TextRange) -> TextRange {
    let start = line_start(text, range.start);
    let end = line_end(text, range.end);
    let before_blank = text[start..range.start].trim().is_empty();
    let after_blank = text[range.end..end].trim().is_empty();
    if before_blank && after_blank {
        let end = if end < text.len() { end + 1 } else { end };
        TextRange::new(start, end)
    } else {
        range
    }
}
