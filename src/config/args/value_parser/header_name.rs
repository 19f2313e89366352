const INVALID_HEADER_NAME: &str = "invalid header name.";

/// Lower-cased header name. Only RFC 7230 token characters are accepted.
pub fn parse_header_name(value: &str) -> Result<String, String> {
    let is_token = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);

    if value.is_empty() || !value.chars().all(is_token) {
        return Err(INVALID_HEADER_NAME.to_string());
    }

    Ok(value.to_ascii_lowercase())
}
