//! Discord message size handling

/// Discord rejects message content longer than this many characters
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Split text into chunks Discord will accept, preferring line breaks.
/// Lines longer than the limit are hard-split on character boundaries.
pub fn split_message(text: &str) -> Vec<String> {
    split_with_limit(text, MAX_MESSAGE_LENGTH)
}

fn split_with_limit(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { line_len + 1 };

        if current_len + needed <= limit {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            current_len += needed;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
        } else {
            let mut piece = String::new();
            let mut piece_len = 0;
            for c in line.chars() {
                if piece_len == limit {
                    chunks.push(std::mem::take(&mut piece));
                    piece_len = 0;
                }
                piece.push(c);
                piece_len += 1;
            }
            current = piece;
            current_len = piece_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
