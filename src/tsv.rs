pub const COMMENT_PREFIX: char = '#';

/// Whether a line carries data, as opposed to a blank or `#` comment line.
pub fn is_data_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with(COMMENT_PREFIX)
}

/// Splits a line on tabs. Empty trailing fields are kept so column
/// positions stay aligned with the header.
pub fn split_line(line: &str) -> Vec<&str> {
    line.trim_end_matches(['\r', '\n']).split('\t').collect()
}
