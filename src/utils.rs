pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn cookie(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!("{name}={value}; HttpOnly; Max-Age={max_age}; Path=/; SameSite=Lax{secure_attr}")
}

pub fn clear_cookie(name: &str, secure: bool) -> String {
    cookie(name, "", 0, secure)
}

/// Derive a URL-safe slug from a quiz title: lowercased, whitespace collapsed
/// to hyphens, everything outside `[a-z0-9-]` dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;
    for c in title.trim().to_lowercase().chars() {
        if c.is_whitespace() {
            if !last_was_hyphen {
                slug.push('-');
                last_was_hyphen = true;
            }
        } else if c.is_ascii_alphanumeric() || c == '-' {
            slug.push(c);
            last_was_hyphen = c == '-';
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
