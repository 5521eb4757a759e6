use serde::{Deserialize, Serialize};

/// Represents a position in a text document using 0-based line and character indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Compute the position of a byte offset inside `text`
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &text[..offset];
        let line = before.matches('\n').count() as u32;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        Self {
            line,
            character: before[line_start..].chars().count() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_offset() {
        let text = "mod a;\nmod b;\n";
        assert_eq!(Position::from_offset(text, 0), Position::new(0, 0));
        assert_eq!(Position::from_offset(text, 11), Position::new(1, 4));
        assert_eq!(Position::from_offset(text, 100), Position::new(2, 0));
    }

    #[test]
    fn test_from_offset_inside_a_char() {
        // `é` spans bytes 4..6
        let text = "mod é;\n";
        assert_eq!(Position::from_offset(text, 5), Position::new(0, 4));
        assert_eq!(Position::from_offset(text, 6), Position::new(0, 5));
    }
}
