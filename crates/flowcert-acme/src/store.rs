//! On-disk certificate layout
//!
//! certbot writes `live/<primary>/{fullchain,privkey}.pem` under its config
//! directory. The store adds `live/<primary>/combined.pem` (fullchain followed
//! by the private key) and a set of per-domain aliases at the top level:
//!
//! ```text
//! <base>/<domain>.pem -> live/<primary>/combined.pem
//! <base>/<domain>.crt -> live/<primary>/fullchain.pem
//! <base>/<domain>.key -> live/<primary>/privkey.pem
//! ```

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use flowcert_core::DomainGroup;
use tracing::{debug, info, instrument};

use crate::error::{AcmeError, Result};

pub const FULLCHAIN_FILE: &str = "fullchain.pem";
pub const PRIVKEY_FILE: &str = "privkey.pem";
pub const COMBINED_FILE: &str = "combined.pem";

/// Alias paths for one domain's certificate material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateBundle {
    pub domain: String,
    pub fullchain: PathBuf,
    pub privkey: PathBuf,
    pub combined: PathBuf,
}

/// Filesystem view of certbot's configuration directory
#[derive(Debug, Clone)]
pub struct CertificateStore {
    base: PathBuf,
}

impl CertificateStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory certbot writes a group's material into
    pub fn live_dir(&self, primary: &str) -> PathBuf {
        self.base.join("live").join(primary)
    }

    /// Alias paths for `domain`, whether or not they exist
    pub fn bundle_for(&self, domain: &str) -> CertificateBundle {
        CertificateBundle {
            domain: domain.to_string(),
            fullchain: self.base.join(format!("{domain}.crt")),
            privkey: self.base.join(format!("{domain}.key")),
            combined: self.base.join(format!("{domain}.pem")),
        }
    }

    /// Find the materialized certificate for `domain`
    ///
    /// Present only when the combined alias resolves to a regular file.
    pub async fn lookup(&self, domain: &str) -> Result<Option<CertificateBundle>> {
        let bundle = self.bundle_for(domain);

        match tokio::fs::metadata(&bundle.combined).await {
            Ok(meta) if meta.is_file() => Ok(Some(bundle)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AcmeError::io(&bundle.combined, e)),
        }
    }

    /// Build the combined artifact for a freshly issued group and point every
    /// domain's aliases at it
    #[instrument(skip(self), fields(primary = %group.primary()))]
    pub async fn materialize(
        &self,
        group: &DomainGroup,
    ) -> Result<BTreeMap<String, CertificateBundle>> {
        let primary = group.primary();
        let live = self.live_dir(primary);

        let fullchain = read_required(primary, &live.join(FULLCHAIN_FILE)).await?;
        let privkey = read_required(primary, &live.join(PRIVKEY_FILE)).await?;

        let mut combined = Vec::with_capacity(fullchain.len() + privkey.len());
        combined.extend_from_slice(&fullchain);
        combined.extend_from_slice(&privkey);

        let combined_path = live.join(COMBINED_FILE);
        let staging_path = live.join(format!("{COMBINED_FILE}.tmp"));
        tokio::fs::write(&staging_path, &combined)
            .await
            .map_err(|e| AcmeError::io(&staging_path, e))?;
        tokio::fs::rename(&staging_path, &combined_path)
            .await
            .map_err(|e| AcmeError::io(&combined_path, e))?;
        debug!(
            path = %combined_path.display(),
            bytes = combined.len(),
            "Wrote combined certificate"
        );

        let relative = Path::new("live").join(primary);
        let mut bundles = BTreeMap::new();

        for domain in group.iter() {
            let bundle = self.bundle_for(domain);
            self.replace_alias(&bundle.combined, &relative.join(COMBINED_FILE))
                .await?;
            self.replace_alias(&bundle.fullchain, &relative.join(FULLCHAIN_FILE))
                .await?;
            self.replace_alias(&bundle.privkey, &relative.join(PRIVKEY_FILE))
                .await?;
            bundles.insert(domain.to_string(), bundle);
        }

        info!(domains = %group, "Certificate materialized");
        Ok(bundles)
    }

    /// Read the combined certificate through its alias
    pub async fn read_combined(&self, bundle: &CertificateBundle) -> Result<Vec<u8>> {
        tokio::fs::read(&bundle.combined).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AcmeError::Consistency {
                    domain: bundle.domain.clone(),
                    path: bundle.combined.clone(),
                }
            } else {
                AcmeError::io(&bundle.combined, e)
            }
        })
    }

    /// Replace `alias` with a link to `target` (relative to the base directory)
    async fn replace_alias(&self, alias: &Path, target: &Path) -> Result<()> {
        // symlink_metadata so dangling links are seen and removed too
        match tokio::fs::symlink_metadata(alias).await {
            Ok(_) => tokio::fs::remove_file(alias)
                .await
                .map_err(|e| AcmeError::io(alias, e))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(AcmeError::io(alias, e)),
        }

        #[cfg(unix)]
        tokio::fs::symlink(target, alias)
            .await
            .map_err(|e| AcmeError::io(alias, e))?;

        #[cfg(not(unix))]
        tokio::fs::copy(self.base.join(target), alias)
            .await
            .map(|_| ())
            .map_err(|e| AcmeError::io(alias, e))?;

        Ok(())
    }
}

async fn read_required(domain: &str, path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            AcmeError::Consistency {
                domain: domain.to_string(),
                path: path.to_path_buf(),
            }
        } else {
            AcmeError::io(path, e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_live(store: &CertificateStore, primary: &str, chain: &[u8], key: &[u8]) {
        let live = store.live_dir(primary);
        tokio::fs::create_dir_all(&live).await.unwrap();
        tokio::fs::write(live.join(FULLCHAIN_FILE), chain).await.unwrap();
        tokio::fs::write(live.join(PRIVKEY_FILE), key).await.unwrap();
    }

    #[tokio::test]
    async fn test_lookup_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CertificateStore::new(dir.path());
        assert!(store.lookup("example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_materialize_combines_fullchain_then_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = CertificateStore::new(dir.path());
        let group = DomainGroup::parse_list("example.com,www.example.com").unwrap();
        write_live(&store, "example.com", b"CHAIN\n", b"KEY\n").await;

        let bundles = store.materialize(&group).await.unwrap();
        assert_eq!(bundles.len(), 2);

        for domain in group.iter() {
            let bundle = store.lookup(domain).await.unwrap().expect("bundle present");
            assert_eq!(store.read_combined(&bundle).await.unwrap(), b"CHAIN\nKEY\n");
            assert_eq!(tokio::fs::read(&bundle.fullchain).await.unwrap(), b"CHAIN\n");
            assert_eq!(tokio::fs::read(&bundle.privkey).await.unwrap(), b"KEY\n");
        }

        assert!(!store
            .live_dir("example.com")
            .join(format!("{COMBINED_FILE}.tmp"))
            .exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_aliases_are_relative_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let store = CertificateStore::new(dir.path());
        let group = DomainGroup::parse_list("example.com").unwrap();
        write_live(&store, "example.com", b"C", b"K").await;

        store.materialize(&group).await.unwrap();

        let target = tokio::fs::read_link(dir.path().join("example.com.pem"))
            .await
            .unwrap();
        assert_eq!(target, Path::new("live/example.com/combined.pem"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_materialize_replaces_dangling_alias() {
        let dir = tempfile::tempdir().unwrap();
        let store = CertificateStore::new(dir.path());
        let group = DomainGroup::parse_list("example.com").unwrap();
        write_live(&store, "example.com", b"C", b"K").await;

        tokio::fs::symlink("live/gone/combined.pem", dir.path().join("example.com.pem"))
            .await
            .unwrap();
        assert!(store.lookup("example.com").await.unwrap().is_none());

        store.materialize(&group).await.unwrap();
        assert!(store.lookup("example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rematerialize_picks_up_new_material() {
        let dir = tempfile::tempdir().unwrap();
        let store = CertificateStore::new(dir.path());
        let group = DomainGroup::parse_list("example.com").unwrap();

        write_live(&store, "example.com", b"OLD", b"K").await;
        store.materialize(&group).await.unwrap();
        write_live(&store, "example.com", b"NEW", b"K").await;
        let bundles = store.materialize(&group).await.unwrap();

        let combined = store
            .read_combined(&bundles["example.com"])
            .await
            .unwrap();
        assert_eq!(combined, b"NEWK");
    }

    #[tokio::test]
    async fn test_missing_material_is_consistency_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CertificateStore::new(dir.path());
        let group = DomainGroup::parse_list("example.com").unwrap();

        let err = store.materialize(&group).await.unwrap_err();
        match err {
            AcmeError::Consistency { domain, path } => {
                assert_eq!(domain, "example.com");
                assert!(path.ends_with("live/example.com/fullchain.pem"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
