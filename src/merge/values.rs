//! Constrained value parsing for the reconciled manifest attributes.
//!
//! These parsers are deliberately stricter than the stdlib equivalents:
//! `minSdkVersion` is decimal digits only, `glEsVersion` is a `0x` hex
//! literal, and `required` is the exact literals `true`/`false`.

/// Value assumed when the main manifest declares no `minSdkVersion`.
pub const DEFAULT_MIN_SDK_VERSION: u32 = 1;

/// Value assumed when the main manifest declares no `glEsVersion`.
pub const DEFAULT_GL_ES_VERSION: u32 = 0x0001_0000;

/// GL ES versions below 1.0 are not meaningful and are ignored.
pub const MIN_GL_ES_VERSION: u32 = 0x0001_0000;

/// Parse an SDK level: decimal digits only, within the signed 32-bit range.
///
/// Returns `None` for anything else (hex, signs, spaces, overflow).
pub fn parse_sdk_version(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok().filter(|&v| v <= i32::MAX as u32)
}

/// Parse a GL ES version: `0x` followed by 1-8 hex digits.
pub fn parse_gl_es_version(raw: &str) -> Option<u32> {
    let hex = raw.strip_prefix("0x")?;
    if hex.is_empty() || hex.len() > 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Render a GL ES version the way the manifest schema writes it.
pub fn format_gl_es_version(version: u32) -> String {
    format!("0x{:08x}", version)
}

/// Parse a `required`-style boolean: the exact literals only.
///
/// Callers treat `None` as `true` after reporting the invalid value.
pub fn parse_required(raw: &str) -> Option<bool> {
    match raw {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
