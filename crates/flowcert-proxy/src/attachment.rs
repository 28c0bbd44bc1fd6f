//! Secret attachments on the proxy service

use serde::{Deserialize, Serialize};

/// Target-file prefix that marks a certificate attachment
pub const CERT_ALIAS_PREFIX: &str = "cert-";

/// One secret mounted into the proxy service's containers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAttachment {
    pub secret_id: String,
    pub secret_name: String,
    /// Target file name inside the container
    pub alias: String,
    pub uid: String,
    pub gid: String,
    pub mode: u32,
}

impl ProxyAttachment {
    /// Attachment exposing a domain's certificate secret as `cert-<domain>`
    pub fn for_certificate(
        domain: &str,
        secret_id: impl Into<String>,
        secret_name: impl Into<String>,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_name: secret_name.into(),
            alias: alias_for(domain),
            uid: "0".to_string(),
            gid: "0".to_string(),
            mode: 0,
        }
    }
}

pub fn alias_for(domain: &str) -> String {
    format!("{CERT_ALIAS_PREFIX}{domain}")
}

/// Swap `new` into the attachment list
///
/// Every entry with the same alias, or whose secret name `is_stale` reports as
/// an older copy of the same certificate, is dropped before `new` is appended.
/// Other attachments keep their order.
pub fn replace_attachment<F>(
    attachments: Vec<ProxyAttachment>,
    new: ProxyAttachment,
    is_stale: F,
) -> Vec<ProxyAttachment>
where
    F: Fn(&str) -> bool,
{
    let mut replaced: Vec<ProxyAttachment> = attachments
        .into_iter()
        .filter(|a| a.alias != new.alias && !is_stale(&a.secret_name))
        .collect();
    replaced.push(new);
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn other(name: &str) -> ProxyAttachment {
        ProxyAttachment {
            secret_id: format!("id-{name}"),
            secret_name: name.to_string(),
            alias: name.to_string(),
            uid: "0".to_string(),
            gid: "0".to_string(),
            mode: 0o444,
        }
    }

    fn cert(domain: &str, id: &str, stamp: &str) -> ProxyAttachment {
        ProxyAttachment::for_certificate(domain, id, format!("{domain}.pem-{stamp}"))
    }

    fn older_example_com(name: &str) -> bool {
        name.starts_with("example.com.pem-")
    }

    #[test]
    fn test_replace_not_append() {
        let old = cert("example.com", "old", "20240101-000000");
        let new = cert("example.com", "new", "20240301-000000");

        let list = vec![other("dfp_users"), old, other("api_key")];
        let once = replace_attachment(list, new.clone(), older_example_com);
        assert_eq!(once, vec![other("dfp_users"), other("api_key"), new.clone()]);

        let twice = replace_attachment(once.clone(), new.clone(), older_example_com);
        assert_eq!(twice, once);
        assert_eq!(
            twice.iter().filter(|a| a.alias == "cert-example.com").count(),
            1
        );
    }

    #[test]
    fn test_replace_drops_stale_secret_under_other_alias() {
        let mut stale = cert("example.com", "old", "20240101-000000");
        stale.alias = "legacy".to_string();
        let new = cert("example.com", "new", "20240301-000000");

        let list = replace_attachment(vec![stale], new.clone(), older_example_com);
        assert_eq!(list, vec![new]);
    }

    #[test]
    fn test_replace_keeps_neighbouring_domains() {
        let sibling = cert("www.example.com", "w", "20240101-000000");
        let new = cert("example.com", "n", "20240301-000000");

        let list = replace_attachment(vec![sibling.clone()], new.clone(), older_example_com);
        assert_eq!(list, vec![sibling, new]);
    }

    #[test]
    fn test_long_domains_with_shared_names_keep_both_attachments() {
        use chrono::{TimeZone, Utc};
        use flowcert_secrets::{is_stale_secret, new_secret_name};

        let one_domain = "one.customer-facing-service.eu-west-1.internal.example.com";
        let two_domain = "two.customer-facing-service.eu-west-1.internal.example.com";
        let at = |month| Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap();
        let one_name = new_secret_name(one_domain, at(1));
        let two_name = new_secret_name(two_domain, at(3));
        let one = ProxyAttachment::for_certificate(one_domain, "1", one_name);
        let two = ProxyAttachment::for_certificate(two_domain, "2", two_name.clone());

        // Same truncated prefix, so only the alias can tell them apart
        assert_eq!(&one.secret_name[..48], &two_name[..48]);

        let list = replace_attachment(vec![one.clone()], two.clone(), |name| {
            is_stale_secret(name, two_domain)
        });
        assert_eq!(list, vec![one.clone(), two.clone()]);

        let renewed = ProxyAttachment::for_certificate(two_domain, "3", two_name);
        let list = replace_attachment(list, renewed.clone(), |name| {
            is_stale_secret(name, two_domain)
        });
        assert_eq!(list, vec![one, renewed]);
    }

    #[test]
    fn test_certificate_attachment_shape() {
        let a = ProxyAttachment::for_certificate("example.com", "id", "name");
        assert_eq!(a.alias, "cert-example.com");
        assert_eq!((a.uid.as_str(), a.gid.as_str(), a.mode), ("0", "0", 0));
    }
}
