//! Domain groups: the host names that share one certificate

use std::fmt;

use crate::error::DomainError;

/// An ordered, deduplicated, non-empty list of host names sharing one certificate.
///
/// The first entry is the primary domain. It names the certificate's directory
/// under `live/` and anchors the Subject Alternative Names of the issued
/// certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainGroup {
    domains: Vec<String>,
}

impl DomainGroup {
    /// Build a group from raw host names.
    ///
    /// Entries are trimmed and lowercased, empty entries are dropped, and
    /// duplicates keep their first position.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Empty`] if nothing usable remains, or
    /// [`DomainError::InvalidHost`] if a name contains a path separator or
    /// whitespace.
    pub fn new<I, S>(hosts: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut domains: Vec<String> = Vec::new();

        for host in hosts {
            let host = host.as_ref().trim().to_ascii_lowercase();
            if host.is_empty() {
                continue;
            }
            if !is_valid_host(&host) {
                return Err(DomainError::InvalidHost(host));
            }
            if !domains.contains(&host) {
                domains.push(host);
            }
        }

        if domains.is_empty() {
            return Err(DomainError::Empty);
        }

        Ok(Self { domains })
    }

    /// Parse a comma separated list such as `example.com,www.example.com`
    pub fn parse_list(list: &str) -> Result<Self, DomainError> {
        Self::new(list.split(','))
    }

    /// The primary domain
    pub fn primary(&self) -> &str {
        &self.domains[0]
    }

    /// All domains, primary first
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Always false: a group holds at least one domain
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl fmt::Display for DomainGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domains.join(","))
    }
}

fn is_valid_host(host: &str) -> bool {
    host != "."
        && host != ".."
        && !host
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_keeps_order_and_dedups() {
        let group = DomainGroup::new(["b.example.com", "A.example.com ", "b.example.com"]).unwrap();
        assert_eq!(group.primary(), "b.example.com");
        assert_eq!(group.domains(), &["b.example.com", "a.example.com"]);
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_parse_list_skips_empty_entries() {
        let group = DomainGroup::parse_list("example.com,,www.example.com,").unwrap();
        assert_eq!(group.to_string(), "example.com,www.example.com");
    }

    #[test]
    fn test_empty_group_rejected() {
        assert_eq!(DomainGroup::parse_list(" , ").unwrap_err(), DomainError::Empty);
        assert_eq!(
            DomainGroup::new(Vec::<String>::new()).unwrap_err(),
            DomainError::Empty
        );
    }

    #[test]
    fn test_path_like_host_rejected() {
        assert!(matches!(
            DomainGroup::parse_list("../etc"),
            Err(DomainError::InvalidHost(_))
        ));
        assert!(matches!(
            DomainGroup::parse_list(".."),
            Err(DomainError::InvalidHost(_))
        ));
    }
}
