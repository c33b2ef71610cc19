//! Case conversion for the wire: property names (PascalCase or snake_case) -> lower camelCase,
//! and case-insensitive matching of incoming body keys against declared property names.

/// Convert a property name to the lower camelCase used on the wire.
/// e.g. "Price" -> "price", "SKU" -> "sku", "ImageUrl" -> "imageUrl", "created_at" -> "createdAt"
pub fn to_camel_case(s: &str) -> String {
    if s.contains('_') {
        return lower_leading_run(&snake_to_camel(s));
    }
    lower_leading_run(s)
}

/// "user_id" -> "userId"
fn snake_to_camel(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = !out.is_empty();
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Lowercase the leading uppercase run, keeping the last capital of an acronym that starts a
/// new word ("URLValue" -> "urlValue").
fn lower_leading_run(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = chars.clone();
    for i in 0..chars.len() {
        if !chars[i].is_uppercase() {
            break;
        }
        let next_is_lower = chars.get(i + 1).map(|c| !c.is_uppercase()).unwrap_or(false);
        if i > 0 && next_is_lower {
            break;
        }
        out[i] = chars[i].to_lowercase().next().unwrap_or(chars[i]);
    }
    out.into_iter().collect()
}

/// Key used for case- and separator-insensitive comparison of body keys with property names.
pub fn match_key(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
