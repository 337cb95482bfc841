//! Template normalization.

/// Replace every newline with the two characters `\` `n`.
///
/// Generated code places literal text inside single-quoted string literals,
/// which cannot span lines. The escaped form decodes back to a newline there,
/// and the script lexer reads it as a line terminator inside directives.
pub fn normalize(template: &str) -> String {
    template.replace('\n', "\\n")
}
