//! Masking of secret material before text leaves the process.

use once_cell::sync::Lazy;
use regex::Regex;

static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)((?:shared[-_ ])?secret\s*[=:]\s*)(\S+)",
        r"(?i)((?:user[-_ ])?password\s*[=:]\s*)(\S+)",
        r"(?i)([A-Z0-9_]*?(KEY|TOKEN|SECRET|PASSWORD)=)([^\s]+)",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("static redaction pattern"))
    .collect()
});

/// Redact values that look like shared secrets or passwords in a string.
/// Transcripts echo the request the execution service saw, so anything
/// printed or logged should pass through here first.
pub fn redact_secrets(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in SECRET_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}<redacted>")
            })
            .to_string();
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_shared_secrets_and_passwords() {
        let input = "secret: testing123 User-Password: hunter2";
        let output = redact_secrets(input);
        assert!(!output.contains("testing123"));
        assert!(!output.contains("hunter2"));
        assert_eq!(output.matches("<redacted>").count(), 2);
    }

    #[test]
    fn masks_env_style_assignments() {
        let output = redact_secrets("RADTEST_API_TOKEN=abc123");
        assert!(!output.contains("abc123"));
    }

    #[test]
    fn leaves_benign_text_alone() {
        let input = "Sending AUTH request to 127.0.0.1";
        assert_eq!(redact_secrets(input), input);
    }
}
