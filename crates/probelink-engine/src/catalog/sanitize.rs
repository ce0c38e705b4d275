/// Cleans a raw catalog body before handing it to the YAML parser.
/// Real-world catalogs frequently carry tabs or stray control bytes that a
/// strict YAML reader rejects outright; this keeps only LF, printable
/// codepoints, and space-expanded tabs, while leaving the newline structure
/// otherwise untouched.
pub fn sanitize_yaml(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\t' => output.push_str("  "),
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    output.push('\n');
                }
            }
            '\n' => output.push('\n'),
            c if c.is_control() => {}
            c => output.push(c),
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_tabs_and_normalizes_newlines() {
        let input = "proxies:\r\n\t- name: a\r\tport: 1\x07\n";
        let sanitized = sanitize_yaml(input);
        assert!(!sanitized.contains('\t'));
        assert!(!sanitized.contains('\r'));
        assert!(!sanitized.contains('\u{7}'));
        assert!(sanitized.starts_with("proxies:\n"));
    }
}
