//! Shell escaping for command lines handed to the build shell

/// Characters that get a backslash when they appear in credential material.
///
/// `+` shows up in generated registry passwords and robot account names.
const SHELL_SIGNIFICANT: &[char] = &[
    '+', '\\', '\'', '"', '$', '`', ';', '&', '|', '<', '>', '(', ')', '{', '}', '[', ']', '*',
    '?', '!', '#', '~', ' ', '\t',
];

/// Characters that never need quoting in a POSIX shell word.
fn is_plain(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ',' | ':' | '/' | '@' | '=' | '%' | '+')
}

/// Backslash-escape shell-significant characters in a credential string.
///
/// Only a single pass is ever applied; escaping an already escaped value
/// escapes the inserted backslashes as well.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if SHELL_SIGNIFICANT.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// POSIX single-quote escaping: replace `'` with `'\''`.
fn single_quote_escape(s: &str) -> String {
    s.replace('\'', "'\\''")
}

/// Quote a word (path, tag, image reference) for the build shell.
///
/// Plain words are returned untouched so command lines stay readable.
pub fn shell_quote(word: &str) -> String {
    if !word.is_empty() && word.chars().all(is_plain) {
        word.to_string()
    } else {
        format!("'{}'", single_quote_escape(word))
    }
}
