/// Split text into newline-aligned chunks of at most `max_chars` characters.
///
/// Whole lines are accumulated until the next one would overflow the limit,
/// then a new chunk is started. A single line longer than the limit becomes
/// its own oversized chunk. Text that already fits (including empty text)
/// comes back as exactly one chunk, so joining the result with `'\n'`
/// always reproduces the input.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current: Option<String> = None;
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        match current.as_mut() {
            Some(buf) if current_len + 1 + line_len <= max_chars => {
                buf.push('\n');
                buf.push_str(line);
                current_len += 1 + line_len;
            }
            _ => {
                if let Some(full) = current.replace(line.to_string()) {
                    chunks.push(full);
                }
                current_len = line_len;
            }
        }
    }

    if let Some(last) = current {
        chunks.push(last);
    }

    chunks
}
