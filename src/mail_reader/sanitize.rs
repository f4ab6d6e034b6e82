use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

fn disallowed() -> &'static Regex {
    static DISALLOWED: OnceLock<Regex> = OnceLock::new();
    DISALLOWED.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("static pattern"))
}

fn is_edge(c: char) -> bool {
    matches!(c, '-' | '_' | '.' | ' ')
}

/// Turns arbitrary text into a filesystem-safe ASCII token, e.g.
/// `"Café Résumé"` becomes `"Cafe-Resume"`.
///
/// Diacritics are removed by NFKD decomposition, anything without an ASCII
/// form is dropped, spaces become `-` and only `[A-Za-z0-9_.-]` survives.
pub fn sanitize(input: &str) -> String {
    let ascii: String = input.nfkd().filter(char::is_ascii).collect();
    let dashed = ascii.trim_matches(is_edge).replace(' ', "-");
    disallowed()
        .replace_all(&dashed, "")
        .trim_matches(is_edge)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_safe(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    }

    #[test]
    fn strips_diacritics_and_replaces_spaces() {
        assert_eq!(sanitize("Café Résumé"), "Cafe-Resume");
        assert_eq!(sanitize("Ärger über Öl"), "Arger-uber-Ol");
    }

    #[test]
    fn strips_edges_and_drops_unsafe_characters() {
        assert_eq!(sanitize(" ._-report.pdf-_. "), "report.pdf");
        assert_eq!(sanitize("a/b\\c:d*e?f"), "abcdef");
        assert_eq!(sanitize("20230715-1000_bob_example-com_Re: hi!"), "20230715-1000_bob_example-com_Re-hi");
    }

    #[test]
    fn drops_characters_without_ascii_form() {
        assert_eq!(sanitize("日本語.txt"), "txt");
        assert_eq!(sanitize("€-x"), "x");
        assert_eq!(sanitize("!-x"), "x");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn output_is_always_in_the_safe_charset() {
        let inputs = [
            "Ünïcödé fïlé",
            "tab\there",
            "emoji 🎉 party",
            "ﬁle ligature",
            "  --__..  ",
            "\u{0}\u{7f}control",
            "quotes \"'`",
        ];
        for input in inputs {
            let out = sanitize(input);
            assert!(is_safe(&out), "{:?} -> {:?}", input, out);
        }
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "Café Résumé",
            "!-x",
            "x-!",
            "a . b",
            "report (final).pdf",
            "=?utf-8?q?caf=C3=A9?=",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn malformed_utf8_is_replaced_not_rejected() {
        let lossy = String::from_utf8_lossy(b"ok\xff\xfename");
        assert_eq!(sanitize(&lossy), "okname");
    }
}
