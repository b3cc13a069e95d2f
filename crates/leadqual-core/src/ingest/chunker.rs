//! Markdown splitting for lead files
//!
//! Lead files separate records with a horizontal rule (`---`). Each record
//! becomes one chunk; records longer than the chunk size are cut again at the
//! nearest natural break.

/// Record separator used in lead markdown files
pub const DEFAULT_SEPARATOR: &str = "---";

/// Maximum characters per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Delimiter-first splitter with a size cap
#[derive(Debug, Clone)]
pub struct MarkdownSplitter {
    separator: String,
    chunk_size: usize,
}

impl Default for MarkdownSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR, DEFAULT_CHUNK_SIZE)
    }
}

impl MarkdownSplitter {
    pub fn new(separator: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            separator: separator.into(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Split text into trimmed, non-empty chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        text.split(self.separator.as_str())
            .map(str::trim)
            .filter(|section| !section.is_empty())
            .flat_map(|section| self.split_oversized(section))
            .collect()
    }

    fn split_oversized(&self, section: &str) -> Vec<String> {
        if section.len() <= self.chunk_size {
            return vec![section.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < section.len() {
            let end = floor_char_boundary(section, start + self.chunk_size);
            let mut chunk_end = end;

            // Prefer a paragraph, sentence, line or word break in the last 30%
            if end < section.len() {
                let search_start = ceil_char_boundary(section, start + self.chunk_size * 7 / 10);
                if search_start < end {
                    let region = &section[search_start..end];
                    let cut = region
                        .rfind("\n\n")
                        .map(|p| p + 2)
                        .or_else(|| region.rfind(". ").map(|p| p + 2))
                        .or_else(|| region.rfind('\n').map(|p| p + 1))
                        .or_else(|| region.rfind(' ').map(|p| p + 1));
                    if let Some(offset) = cut {
                        chunk_end = search_start + offset;
                    }
                }
            }

            // A single wide character can exceed a tiny chunk size
            if chunk_end <= start {
                chunk_end = ceil_char_boundary(section, start + 1);
            }

            let piece = section[start..chunk_end].trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }
            start = chunk_end;
        }

        chunks
    }
}

/// Find a valid char boundary at or before the given byte index
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Find a valid char boundary at or after the given byte index
fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_separator() {
        let text = "## Jane Doe\nAcme Corp\n\n---\n\n## Bob Smith\nGlobex\n---\n";
        let chunks = MarkdownSplitter::default().split(text);
        assert_eq!(chunks, vec!["## Jane Doe\nAcme Corp", "## Bob Smith\nGlobex"]);
    }

    #[test]
    fn test_empty_sections_dropped() {
        let chunks = MarkdownSplitter::default().split("---\n\n---\n   \n---");
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_oversized_section_resplit() {
        let paragraph = "Procurement lead at a mid-size firm. ".repeat(10);
        let splitter = MarkdownSplitter::new("---", 100);
        let chunks = splitter.split(&paragraph);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 100);
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn test_unicode_boundaries() {
        let text = "Zoë Müller, Einkäufer bei Äcme GmbH · 采购经理 ".repeat(5);
        let chunks = MarkdownSplitter::new("---", 16).split(&text);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }
}
