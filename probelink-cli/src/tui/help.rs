/// Static one-line help, shown at the bottom of the screen. The close-detail
/// binding is only shown while a detail panel is open.
pub fn short_help(detail_visible: bool) -> String {
    if detail_visible {
        "\u{2191}/\u{2193} move \u{2022} enter toggle detail \u{2022} esc close details \u{2022} q quit".to_owned()
    } else {
        "\u{2191}/\u{2193} move \u{2022} enter toggle detail \u{2022} click header to sort \u{2022} \u{2190}/\u{2192} sort column \u{2022} s reverse \u{2022} q quit".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_close_detail_only_when_visible() {
        assert!(short_help(true).contains("close details"));
        assert!(!short_help(false).contains("close details"));
    }
}
