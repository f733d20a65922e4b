//! Time formatting helpers

/// Format a second count as a zero-padded `mm:ss` clock
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Parse a minute or second input field leniently; anything unparsable is 0
pub fn parse_clock_field(input: &str) -> u64 {
    let input = input.trim();
    let digits = input
        .strip_prefix('+')
        .unwrap_or(input)
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or_default();
    digits.parse().unwrap_or(0)
}
