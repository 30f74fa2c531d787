//! Login and deep-link URLs.

use std::sync::LazyLock;

use regex::Regex;

/// Job numbers as they appear in links, e.g. `SKY018` or `SKY 018`.
static JOB_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _-]{0,31}$").expect("job number pattern compiles")
});

pub fn is_valid_job_number(job: &str) -> bool {
    JOB_NUMBER.is_match(job)
}

/// Encode a validated job number for use in a path or query string.
/// Only spaces need escaping given the allowed character set.
pub fn encode_job_number(job: &str) -> String {
    job.replace(' ', "%20")
}

/// `{base}/verify?token=<token>`
pub fn magic_link_url(public_base: &str, token: &str) -> String {
    format!("{public_base}/verify?token={token}")
}

/// `{base}/job/<job>?t=<token>`, or `None` for an invalid job number.
pub fn deep_link_url(public_base: &str, job: &str, token: &str) -> Option<String> {
    is_valid_job_number(job)
        .then(|| format!("{public_base}/job/{}?t={token}", encode_job_number(job)))
}

/// Where the browser lands after redeeming a deep link.
pub fn job_landing(job: &str) -> String {
    format!("/?job={}", encode_job_number(job))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_numbers() {
        assert!(is_valid_job_number("SKY018"));
        assert!(is_valid_job_number("SKY 018"));
        assert!(is_valid_job_number("tow-001_b"));
        assert!(!is_valid_job_number(""));
        assert!(!is_valid_job_number(" SKY"));
        assert!(!is_valid_job_number("SKY/../admin"));
        assert!(!is_valid_job_number("SKY?x=1"));
        assert!(!is_valid_job_number(&"A".repeat(33)));
    }

    #[test]
    fn links_are_built_from_public_base() {
        assert_eq!(
            magic_link_url("https://hub.example.com", "abc"),
            "https://hub.example.com/verify?token=abc"
        );
        assert_eq!(
            deep_link_url("https://hub.example.com", "SKY 018", "abc").as_deref(),
            Some("https://hub.example.com/job/SKY%20018?t=abc")
        );
        assert!(deep_link_url("https://hub.example.com", "a/b", "abc").is_none());
    }

    #[test]
    fn landing_escapes_space() {
        assert_eq!(job_landing("SKY 018"), "/?job=SKY%20018");
        assert_eq!(job_landing("SKY018"), "/?job=SKY018");
    }
}
