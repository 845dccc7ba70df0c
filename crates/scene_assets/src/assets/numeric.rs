//! Best-effort numeric parsing for OBJ and MTL tokens
//!
//! Malformed numbers never abort a load. Each helper returns the parsed value
//! or the caller's default.

/// Parse a float token, falling back to `default`
pub fn parse_or(token: &str, default: f32) -> f32 {
    token.parse().unwrap_or(default)
}

/// Read up to `N` floats from a token stream
///
/// Components are read left to right. The first missing or unparsable token
/// stops reading, leaving that component and every later one at its default.
pub fn parse_floats<'a, const N: usize>(
    tokens: impl IntoIterator<Item = &'a str>,
    defaults: [f32; N],
) -> [f32; N] {
    let mut values = defaults;
    let mut tokens = tokens.into_iter();

    for value in &mut values {
        match tokens.next().map(str::parse::<f32>) {
            Some(Ok(parsed)) => *value = parsed,
            _ => break,
        }
    }

    values
}

/// Parse a face index part
///
/// Reads an optional sign followed by leading digits, so `"12abc"` gives 12.
/// Empty or non-numeric parts give 0, which OBJ never uses as an index.
pub fn parse_index(part: &str) -> i64 {
    let part = part.trim();
    let (sign, digits) = match part.as_bytes().first() {
        Some(b'-') => (-1, &part[1..]),
        Some(b'+') => (1, &part[1..]),
        _ => (1, part),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end].parse::<i64>().map_or(0, |value| sign * value)
}
