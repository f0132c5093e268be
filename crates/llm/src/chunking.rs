/// Text chunk
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// Chunk text
    pub text: String,

    /// Start byte offset in original text
    pub start: usize,

    /// End byte offset in original text
    pub end: usize,
}

/// Split a document on a literal marker, dropping empty pieces
pub fn split_on_marker(text: &str, marker: &str) -> Vec<String> {
    if marker.is_empty() {
        let trimmed = text.trim();
        return if trimmed.is_empty() { Vec::new() } else { vec![trimmed.to_string()] };
    }

    text.split(marker)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Split text by paragraphs
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Split text into overlapping chunks by token count (approximate)
pub fn chunk_text(text: &str, max_tokens: usize, overlap: usize) -> Vec<TextChunk> {
    // Approximate: 1 token ≈ 4 bytes
    let chars_per_token = 4;
    let max_chars = (max_tokens * chars_per_token).max(1);
    let overlap_chars = (overlap * chars_per_token).min(max_chars - 1);

    let text_len = text.len();
    if text_len <= max_chars {
        return vec![TextChunk {
            text: text.to_string(),
            start: 0,
            end: text_len,
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text_len {
        let end = ceil_char_boundary(text, (start + max_chars).min(text_len));

        let actual_end = if end < text_len {
            find_break_point(text, start, end)
        } else {
            end
        };

        chunks.push(TextChunk {
            text: text[start..actual_end].to_string(),
            start,
            end: actual_end,
        });

        if actual_end >= text_len {
            break;
        }

        // Step back for overlap, but always make progress
        let next = floor_char_boundary(text, actual_end.saturating_sub(overlap_chars));
        start = if next > start { next } else { actual_end };
    }

    chunks
}

/// Find a good breaking point (sentence boundary)
fn find_break_point(text: &str, start: usize, ideal_end: usize) -> usize {
    // Look for sentence endings within the last 20% of the chunk
    let search_start = ceil_char_boundary(text, start + ((ideal_end - start) * 80 / 100));
    if search_start >= ideal_end {
        return ideal_end;
    }
    let search_text = &text[search_start..ideal_end];

    let sentence_endings = [". ", ".\n", "! ", "!\n", "? ", "?\n", "。", "！", "？"];

    sentence_endings
        .iter()
        .filter_map(|ending| search_text.rfind(ending).map(|idx| search_start + idx + ending.len()))
        .max()
        .unwrap_or(ideal_end)
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
