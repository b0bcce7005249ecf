//! Object storage for the DVC remote.
//!
//! The bucket API sits behind [`BucketStore`]; [`S3Client`] talks to the
//! S3 REST API directly.

mod credentials;
mod s3;
mod sigv4;

pub use credentials::{resolve_credentials, Credentials};
pub use s3::{parse_bucket_names, S3Client};

use serde::Serialize;

use crate::dvc::{Dvc, DvcOutput};
use crate::error::Result;

pub const DEFAULT_DVC_REMOTE: &str = "remotedvcs3";

/// Minimal bucket API needed to prepare a remote.
pub trait BucketStore {
    fn list_buckets(&self) -> Result<Vec<String>>;
    fn create_bucket(&self, name: &str, region: &str) -> Result<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoteOutput {
    pub bucket: String,
    pub region: String,
    pub remote_name: String,
    pub url: String,
    pub bucket_created: bool,
    pub remote: DvcOutput,
}

pub fn remote_url(bucket: &str) -> String {
    format!("s3://{}", bucket)
}

/// Create `bucket` unless a bucket with exactly that name is listed.
///
/// Returns whether the bucket was created.
pub fn ensure_bucket(store: &dyn BucketStore, bucket: &str, region: &str) -> Result<bool> {
    let existing = store.list_buckets()?;
    if existing.iter().any(|b| b == bucket) {
        log_status!("storage", "S3 bucket '{}' already exists.", bucket);
        return Ok(false);
    }

    store.create_bucket(bucket, region)?;
    log_status!("storage", "Created S3 bucket: {}", bucket);
    Ok(true)
}

/// Make sure the bucket exists, then register it as DVC's default remote.
pub fn configure_remote(
    store: &dyn BucketStore,
    dvc: &Dvc,
    bucket: &str,
    region: &str,
    remote_name: &str,
) -> Result<RemoteOutput> {
    let bucket_created = ensure_bucket(store, bucket, region)?;
    let url = remote_url(bucket);
    let remote = dvc.add_default_remote(remote_name, &url)?;

    Ok(RemoteOutput {
        bucket: bucket.to_string(),
        region: region.to_string(),
        remote_name: remote_name.to_string(),
        url,
        bucket_created,
        remote,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;

    use super::BucketStore;
    use crate::error::{Error, Result};

    /// In-memory bucket list that records create calls.
    #[derive(Default)]
    pub struct MemoryStore {
        pub buckets: RefCell<Vec<String>>,
        pub created: RefCell<Vec<(String, String)>>,
        pub fail_list: bool,
    }

    impl MemoryStore {
        pub fn with_buckets(names: &[&str]) -> Self {
            Self {
                buckets: RefCell::new(names.iter().map(|n| n.to_string()).collect()),
                ..Self::default()
            }
        }
    }

    impl BucketStore for MemoryStore {
        fn list_buckets(&self) -> Result<Vec<String>> {
            if self.fail_list {
                return Err(Error::storage_credentials_missing("default"));
            }
            Ok(self.buckets.borrow().clone())
        }

        fn create_bucket(&self, name: &str, region: &str) -> Result<()> {
            self.created
                .borrow_mut()
                .push((name.to_string(), region.to_string()));
            self.buckets.borrow_mut().push(name.to_string());
            Ok(())
        }
    }
}
