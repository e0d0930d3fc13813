//! Secret strength scoring
//!
//! A candidate secret is scored against a [`SecretPolicy`] for length,
//! character set, Shannon entropy, character diversity and known weak
//! patterns. The resulting report never contains the secret itself.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Characters allowed in a secret (standard and URL-safe base64 alphabets)
static ALLOWED_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9+/=_\-]+$").expect("static secret charset pattern is valid")
});

/// Case-insensitive substrings that disqualify a secret
pub const WEAK_PATTERNS: &[&str] = &[
    "secret", "password", "changeme", "test", "default", "qwerty", "admin", "letmein", "123456",
];

/// Runs of identical characters at least this long disqualify a secret
pub const MAX_REPEATED_RUN: usize = 6;

/// Diversity is measured over at most this many characters
const DIVERSITY_WINDOW: usize = 64;

const LENGTH_PENALTY: i32 = 30;
const SHORT_LENGTH_PENALTY: i32 = 10;
const CHARSET_PENALTY: i32 = 20;
const LOW_ENTROPY_PENALTY: i32 = 25;
const FAIR_ENTROPY_PENALTY: i32 = 10;
const DIVERSITY_PENALTY: i32 = 15;
const WEAK_PATTERN_PENALTY: i32 = 40;

/// Thresholds a secret is scored against
#[derive(Debug, Clone, PartialEq)]
pub struct SecretPolicy {
    /// Shorter secrets fail
    pub min_length: usize,
    /// Shorter secrets draw a recommendation
    pub recommended_length: usize,
    /// Minimum Shannon entropy in bits per character
    pub min_entropy: f64,
    /// Entropy below this draws a recommendation
    pub good_entropy: f64,
    /// Minimum ratio of distinct characters
    pub min_diversity: f64,
    /// Whether low entropy and low diversity fail validation
    pub strict: bool,
}

impl Default for SecretPolicy {
    fn default() -> Self {
        Self {
            min_length: 32,
            recommended_length: 64,
            min_entropy: 3.5,
            good_entropy: 4.0,
            min_diversity: 0.5,
            strict: true,
        }
    }
}

impl SecretPolicy {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            ..Self::default()
        }
    }

    /// Scores `secret` against this policy
    pub fn validate(&self, secret: &str) -> SecretValidationReport {
        let length = secret.chars().count();
        let entropy = shannon_entropy(secret);
        let diversity = character_diversity(secret);

        let mut score: i32 = 100;
        let mut reasons = Vec::new();
        let mut hard_failures = Vec::new();
        let mut recommendations = Vec::new();

        if length < self.min_length {
            score -= LENGTH_PENALTY;
            let reason = format!(
                "secret is too short ({} characters, minimum {})",
                length, self.min_length
            );
            hard_failures.push(reason.clone());
            reasons.push(reason);
            recommendations.push(format!(
                "use at least {} characters, {} or more preferred",
                self.min_length, self.recommended_length
            ));
        } else if length < self.recommended_length {
            score -= SHORT_LENGTH_PENALTY;
            recommendations.push(format!(
                "use {} or more characters for stronger security",
                self.recommended_length
            ));
        }

        if length == 0 || !ALLOWED_CHARSET.is_match(secret) {
            score -= CHARSET_PENALTY;
            let reason = "secret contains characters outside [A-Za-z0-9+/=_-]".to_string();
            hard_failures.push(reason.clone());
            reasons.push(reason);
            recommendations.push("restrict the secret to base64 or URL-safe base64 characters".to_string());
        }

        if entropy < self.min_entropy {
            score -= LOW_ENTROPY_PENALTY;
            if self.strict {
                reasons.push(format!(
                    "entropy too low ({:.2} bits per character, minimum {:.1})",
                    entropy, self.min_entropy
                ));
            }
            recommendations.push("generate the secret from a cryptographically secure random source".to_string());
        } else if entropy < self.good_entropy {
            score -= FAIR_ENTROPY_PENALTY;
            recommendations.push(format!(
                "increase randomness to reach {:.1} bits per character",
                self.good_entropy
            ));
        }

        if diversity < self.min_diversity {
            score -= DIVERSITY_PENALTY;
            if self.strict {
                reasons.push(format!(
                    "too few distinct characters ({:.0}% unique, minimum {:.0}%)",
                    diversity * 100.0,
                    self.min_diversity * 100.0
                ));
            }
            recommendations.push("use a wider variety of characters".to_string());
        }

        if let Some(pattern) = find_weak_pattern(secret) {
            score -= WEAK_PATTERN_PENALTY;
            let reason = format!("secret contains a known weak pattern ({})", pattern);
            hard_failures.push(reason.clone());
            reasons.push(reason);
            recommendations.push("avoid dictionary words, defaults and repeated characters".to_string());
        }

        SecretValidationReport {
            valid: reasons.is_empty(),
            score: score.clamp(0, 100) as u8,
            reasons,
            recommendations,
            length,
            entropy,
            diversity,
            hard_failures,
        }
    }
}

/// Outcome of scoring one secret
#[derive(Debug, Clone, PartialEq)]
pub struct SecretValidationReport {
    /// No failing check under the policy in effect
    pub valid: bool,
    /// 0 (worst) to 100 (best)
    pub score: u8,
    /// Failed checks
    pub reasons: Vec<String>,
    /// Advice for every failed or weak check
    pub recommendations: Vec<String>,
    /// Length in characters
    pub length: usize,
    /// Shannon entropy in bits per character
    pub entropy: f64,
    /// Ratio of distinct characters
    pub diversity: f64,
    hard_failures: Vec<String>,
}

impl SecretValidationReport {
    /// Failures that apply whether or not strict mode is on
    pub fn hard_failures(&self) -> &[String] {
        &self.hard_failures
    }
}

/// Scores `secret` under the default strict policy
pub fn validate_secret(secret: &str) -> SecretValidationReport {
    SecretPolicy::default().validate(secret)
}

/// Shannon entropy of the character distribution, in bits per character
pub fn shannon_entropy(value: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for ch in value.chars() {
        *counts.entry(ch).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Distinct characters divided by `min(length, 64)`
///
/// Capping the denominator keeps long random secrets, which cannot use more
/// than 64 distinct base64 characters, from being penalized.
pub fn character_diversity(value: &str) -> f64 {
    let length = value.chars().count();
    if length == 0 {
        return 0.0;
    }
    let unique: HashSet<char> = value.chars().collect();
    unique.len() as f64 / length.min(DIVERSITY_WINDOW) as f64
}

fn find_weak_pattern(secret: &str) -> Option<String> {
    let lowered = secret.to_lowercase();
    if let Some(pattern) = WEAK_PATTERNS.iter().find(|pattern| lowered.contains(*pattern)) {
        return Some((*pattern).to_string());
    }

    let mut run = 0usize;
    let mut last = None;
    for ch in secret.chars() {
        if Some(ch) == last {
            run += 1;
        } else {
            run = 1;
            last = Some(ch);
        }
        if run >= MAX_REPEATED_RUN {
            return Some(format!("{} repeated characters", MAX_REPEATED_RUN));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRONG: &str = "Jx9kQ2mV7pR4tW8zLb3nC6yH1dF5gS0aEuIoPqZrXvNcMbTy-_KjUhGfDsAe";

    #[test]
    fn test_strong_secret_passes() {
        let report = validate_secret(STRONG);
        assert!(report.valid, "reasons: {:?}", report.reasons);
        assert!(report.reasons.is_empty());
        assert!(report.hard_failures().is_empty());
        assert!(report.entropy > 4.0);
        // 60 characters, below the recommended 64
        assert_eq!(report.score, 90);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn test_short_weak_secret() {
        let report = validate_secret("test");
        assert!(!report.valid);
        assert!(report.score < 30);
        assert!(report.reasons.iter().any(|r| r.contains("too short")));
        assert!(report.reasons.iter().any(|r| r.contains("weak pattern")));
        assert_eq!(report.hard_failures().len(), 2);
    }

    #[test]
    fn test_weak_pattern_rejected_regardless_of_strength() {
        let secret = format!("{}PassWord", STRONG);
        let report = validate_secret(&secret);
        assert!(!report.valid);
        assert!(report.hard_failures().iter().any(|r| r.contains("password")));
    }

    #[test]
    fn test_repeated_run_rejected() {
        let secret = format!("{}zzzzzz", &STRONG[..40]);
        let report = validate_secret(&secret);
        assert!(!report.valid);
        assert!(report.reasons.iter().any(|r| r.contains("repeated")));
    }

    #[test]
    fn test_invalid_charset() {
        let secret = format!("{}!@", &STRONG[..40]);
        let report = validate_secret(&secret);
        assert!(!report.valid);
        assert!(report.hard_failures().iter().any(|r| r.contains("outside")));
    }

    #[test]
    fn test_lenient_policy_only_fails_hard_checks() {
        let low_entropy = "abababababababababababababababababab";
        let strict = SecretPolicy::new(true).validate(low_entropy);
        let lenient = SecretPolicy::new(false).validate(low_entropy);

        assert!(!strict.valid);
        assert!(lenient.valid);
        assert_eq!(strict.score, lenient.score);
        assert!(lenient.recommendations.len() >= 2);
    }

    #[test]
    fn test_entropy_values() {
        assert_eq!(shannon_entropy(""), 0.0);
        assert_eq!(shannon_entropy("aaaa"), 0.0);
        assert!((shannon_entropy("ab") - 1.0).abs() < 1e-9);
        assert!((shannon_entropy("abcd") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_diversity_window() {
        assert!((character_diversity("abcd") - 1.0).abs() < 1e-9);
        assert!((character_diversity("aabb") - 0.5).abs() < 1e-9);
        let long: String = STRONG.chars().cycle().take(256).collect();
        assert!(character_diversity(&long) > 0.9);
    }

    #[test]
    fn test_higher_entropy_never_scores_lower() {
        // Same length (40) and same set of used characters {a..e}
        let skewed = format!("{}{}", "abcde", "aaaaabbbbbaaaaabbbbbaaaaabbbbbaaaaa");
        let balanced: String = "abcde".chars().cycle().take(40).collect();
        assert!(shannon_entropy(&balanced) > shannon_entropy(&skewed));
        assert!(validate_secret(&balanced).score >= validate_secret(&skewed).score);
    }

    #[test]
    fn test_report_never_contains_secret() {
        let report = validate_secret(STRONG);
        let rendered = format!("{:?}", report);
        assert!(!rendered.contains(STRONG));
    }
}
