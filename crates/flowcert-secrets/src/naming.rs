//! Secret naming
//!
//! Orchestrator secret names are limited to 64 characters. A certificate
//! secret is named `<domain>.pem-<YYYYMMDD-HHMMSS>`; when that does not fit,
//! the leftmost characters of `<domain>.pem` are dropped so the more specific
//! tail of the domain survives.
//!
//! A full-length prefix may be shared by several domains, so a name alone only
//! identifies its domain when the prefix is shorter than the cap. Otherwise the
//! owner comes from the secret's domain label.

use chrono::{DateTime, NaiveDateTime, Utc};

pub const MAX_SECRET_NAME_LEN: usize = 64;

const SUFFIX_FORMAT: &str = "%Y%m%d-%H%M%S";
const SUFFIX_LEN: usize = "YYYYMMDD-HHMMSS".len();
const PREFIX_LEN: usize = MAX_SECRET_NAME_LEN - SUFFIX_LEN - 1;

/// Deterministic leading part of every secret name for `domain`
pub fn secret_name_prefix(domain: &str) -> String {
    let base = format!("{domain}.pem");
    right_truncate(&base, PREFIX_LEN).to_string()
}

/// Whether `domain`'s secret names cannot be produced by any other domain
pub fn name_identifies_domain(domain: &str) -> bool {
    domain.len() + ".pem".len() < PREFIX_LEN
}

pub fn timestamp_suffix(at: DateTime<Utc>) -> String {
    at.format(SUFFIX_FORMAT).to_string()
}

/// Name for a secret created at `at`
pub fn new_secret_name(domain: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}", secret_name_prefix(domain), timestamp_suffix(at))
}

/// Creation time encoded in `name`, if `name` belongs to `domain`
pub fn parse_secret_name(name: &str, domain: &str) -> Option<NaiveDateTime> {
    let prefix = secret_name_prefix(domain);
    let suffix = name.strip_prefix(prefix.as_str())?.strip_prefix('-')?;
    if suffix.len() != SUFFIX_LEN {
        return None;
    }
    NaiveDateTime::parse_from_str(suffix, SUFFIX_FORMAT).ok()
}

pub fn belongs_to(name: &str, domain: &str) -> bool {
    parse_secret_name(name, domain).is_some()
}

/// Creation time of a secret owned by `domain`
///
/// `label` is the domain recorded on the secret when it was created. Unlabelled
/// secrets are only claimed when their name cannot belong to another domain.
pub fn owned_by(name: &str, label: Option<&str>, domain: &str) -> Option<NaiveDateTime> {
    match label {
        Some(owner) if owner != domain => None,
        Some(_) => parse_secret_name(name, domain),
        None if name_identifies_domain(domain) => parse_secret_name(name, domain),
        None => None,
    }
}

/// Whether an attached secret named `name` is an older copy of `domain`'s certificate
pub fn is_stale_secret(name: &str, domain: &str) -> bool {
    name_identifies_domain(domain) && belongs_to(name, domain)
}

fn right_truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn test_short_domain_name() {
        assert_eq!(
            new_secret_name("example.com", at()),
            "example.com.pem-20240309-070501"
        );
    }

    #[test]
    fn test_long_domain_is_truncated_from_the_left() {
        let domain = format!("{}.example.com", "a".repeat(80));
        let name = new_secret_name(&domain, at());

        assert_eq!(name.len(), MAX_SECRET_NAME_LEN);
        assert!(name.ends_with(".example.com.pem-20240309-070501"));
        assert!(belongs_to(&name, &domain));
    }

    #[test]
    fn test_length_bound_holds_around_the_limit() {
        for len in 40..=70 {
            let domain = "d".repeat(len);
            let name = new_secret_name(&domain, at());
            assert!(name.len() <= MAX_SECRET_NAME_LEN, "len {len} -> {}", name.len());
            assert!(name.is_ascii());
        }
    }

    fn long_domain(label: &str) -> String {
        format!("{label}.customer-facing-service.eu-west-1.internal.example.com")
    }

    #[test]
    fn test_long_domains_can_share_a_prefix() {
        let one = long_domain("one");
        let two = long_domain("two");

        assert_eq!(secret_name_prefix(&one), secret_name_prefix(&two));
        assert!(!name_identifies_domain(&one));
        assert!(name_identifies_domain("example.com"));

        // Without a label neither domain can claim the shared name
        let name = new_secret_name(&two, at());
        assert!(belongs_to(&name, &one));
        assert_eq!(owned_by(&name, None, &one), None);
        assert_eq!(owned_by(&name, Some(two.as_str()), &one), None);
        assert_eq!(owned_by(&name, Some(two.as_str()), &two), Some(at().naive_utc()));
        assert!(!is_stale_secret(&name, &one));
    }

    #[test]
    fn test_prefix_at_the_cap_is_ambiguous() {
        // 44 + ".pem" fills the prefix exactly; one more leading character
        // truncates back to the same prefix
        let exact = format!("{}.example.com", "e".repeat(32));
        assert_eq!(exact.len(), 44);
        let longer = format!("x{exact}");

        assert_eq!(secret_name_prefix(&exact), secret_name_prefix(&longer));
        assert!(!name_identifies_domain(&exact));
        assert!(name_identifies_domain(&exact[1..]));
    }

    #[test]
    fn test_unlabelled_short_names_are_claimed() {
        let name = new_secret_name("example.com", at());
        assert_eq!(owned_by(&name, None, "example.com"), Some(at().naive_utc()));
        assert_eq!(owned_by(&name, Some("other.com"), "example.com"), None);
        assert!(is_stale_secret(&name, "example.com"));
        assert!(!is_stale_secret("example.com.pem-x.pem-20240309-070501", "example.com"));
    }

    #[test]
    fn test_parse_secret_name() {
        let name = new_secret_name("example.com", at());
        assert_eq!(
            parse_secret_name(&name, "example.com"),
            Some(at().naive_utc())
        );

        // A longer domain sharing the prefix is not a match
        assert!(!belongs_to("example.com.au.pem-20240309-070501", "example.com"));
        assert!(!belongs_to("example.com.pem-latest", "example.com"));
        assert!(!belongs_to("example.com.pem", "example.com"));
    }
}
