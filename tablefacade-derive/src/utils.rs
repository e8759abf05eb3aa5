//! Utility functions for code generation

/// Upper-case the first character if it is an ASCII letter.
///
/// Must agree with the runtime resolver, which looks accessors up by the names built
/// from this.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(s.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

/// Field name as written in source, without a raw identifier prefix.
pub fn field_name(ident: &syn::Ident) -> String {
    let name = ident.to_string();
    match name.strip_prefix("r#") {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}
