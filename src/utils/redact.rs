use once_cell::sync::Lazy;
use regex::Regex;

const INLINE_REDACTION: &str = "***REDACTED***";

static INLINE_REDACTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\bsk-proj-[A-Za-z0-9_-]{10,}\b").expect("inline redaction regex"),
            "sk-proj-***REDACTED***",
        ),
        (
            Regex::new(r"\bsk-[A-Za-z0-9_-]{10,}\b").expect("inline redaction regex"),
            "sk-***REDACTED***",
        ),
        (
            Regex::new(r"\bAIza[0-9A-Za-z_-]{20,}\b").expect("inline redaction regex"),
            "AIza***REDACTED***",
        ),
        (
            Regex::new(r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b")
                .expect("inline redaction regex"),
            INLINE_REDACTION,
        ),
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~+/=-]{6,})").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r#"\b(token|api[_-]?key|secret|client[_-]?secret|access[_-]?token|code)\b\s*([:=])\s*([^\s"'&`,}]+)"#)
                .expect("inline redaction regex"),
            "$1$2***REDACTED***",
        ),
    ]
});

/// Masks bearer tokens, provider API keys and `key=value` secrets in free text.
pub fn redact_text(value: &str) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_REDACTION_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    out
}
