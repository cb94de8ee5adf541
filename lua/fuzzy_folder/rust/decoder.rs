use crate::config::DecodeLimits;

/// Turns a tool's stdout into at most `max_items` labels, reading at most
/// `max_size` bytes of it.
///
/// The byte cut can land inside a line or a multi-byte character. A line the
/// cut went through is dropped rather than shown truncated; invalid UTF-8 is
/// replaced, never rejected. Empty lines are skipped, so an empty buffer or a
/// trailing newline yields no items.
pub fn decode_list(bytes: &[u8], limits: DecodeLimits) -> Vec<String> {
    let cut = bytes.len().min(limits.max_size);
    let window = &bytes[..cut];

    let cut_mid_line = cut < bytes.len() && bytes[cut] != b'\n' && window.last() != Some(&b'\n');
    let complete = if cut_mid_line {
        match window.iter().rposition(|&b| b == b'\n') {
            Some(last_newline) => &window[..last_newline],
            None => &[][..],
        }
    } else {
        window
    };

    String::from_utf8_lossy(complete)
        .split('\n')
        .filter(|line| !line.is_empty())
        .take(limits.max_items)
        .map(str::to_owned)
        .collect()
}
