use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::{Method, Url};

use super::sigv4::{self, RequestParts};
use super::{resolve_credentials, BucketStore, Credentials};
use crate::error::{Error, Result, StorageRequestFailedDetails};

const SERVICE: &str = "s3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// S3 REST client using path-style requests.
pub struct S3Client {
    client: Client,
    endpoint: Url,
    region: String,
    credentials: Credentials,
}

impl S3Client {
    /// Build a client for `region`, resolving credentials from the environment.
    pub fn new(region: &str, endpoint: Option<&str>) -> Result<Self> {
        Self::with_credentials(region, endpoint, resolve_credentials()?)
    }

    pub fn with_credentials(
        region: &str,
        endpoint: Option<&str>,
        credentials: Credentials,
    ) -> Result<Self> {
        let raw = endpoint
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_else(|| default_endpoint(region));
        let endpoint = Url::parse(&raw).map_err(|e| {
            Error::config_invalid_value("storage_endpoint", Some(raw.clone()), e.to_string())
        })?;
        if endpoint.path() != "/" {
            return Err(Error::config_invalid_value(
                "storage_endpoint",
                Some(raw),
                "must not contain a path; buckets are addressed as /<bucket> on the host",
            ));
        }

        let client = Client::builder()
            .user_agent(format!("dvcflow/{}", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::internal_io(e.to_string(), Some("create HTTP client".to_string())))?;

        Ok(Self {
            client,
            endpoint,
            region: region.to_string(),
            credentials,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn send(&self, method: Method, path: &str, body: Vec<u8>, operation: &str) -> Result<String> {
        let url = self.endpoint.join(path).map_err(|e| {
            Error::internal_unexpected(format!("Invalid storage path '{}': {}", path, e))
        })?;
        let host = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => format!("{}:{}", h, p),
            (Some(h), None) => h.to_string(),
            (None, _) => {
                return Err(Error::config_invalid_value(
                    "storage_endpoint",
                    Some(self.endpoint.to_string()),
                    "endpoint has no host",
                ))
            }
        };

        let headers = sigv4::sign(
            &RequestParts {
                method: method.as_str(),
                host: &host,
                path: url.path(),
                payload: &body,
            },
            &self.credentials,
            &self.region,
            SERVICE,
            chrono::Utc::now(),
        )?;

        let mut request = self.client.request(method, url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().map_err(|e| {
            Error::storage_request_failed(StorageRequestFailedDetails {
                operation: operation.to_string(),
                status: None,
                aws_code: None,
                error: e.to_string(),
            })
        })?;

        let status = response.status();
        let text = response.text().map_err(|e| {
            Error::storage_request_failed(StorageRequestFailedDetails {
                operation: operation.to_string(),
                status: Some(status.as_u16()),
                aws_code: None,
                error: e.to_string(),
            })
        })?;

        if !status.is_success() {
            let (aws_code, message) = parse_error(&text);
            return Err(Error::storage_request_failed(StorageRequestFailedDetails {
                operation: operation.to_string(),
                status: Some(status.as_u16()),
                aws_code,
                error: message.unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            }));
        }

        Ok(text)
    }
}

impl BucketStore for S3Client {
    fn list_buckets(&self) -> Result<Vec<String>> {
        let body = self.send(Method::GET, "/", Vec::new(), "ListBuckets")?;
        parse_bucket_names(&body)
    }

    fn create_bucket(&self, name: &str, region: &str) -> Result<()> {
        let body = create_bucket_body(region).unwrap_or_default();
        self.send(
            Method::PUT,
            &format!("/{}", name),
            body.into_bytes(),
            "CreateBucket",
        )?;
        Ok(())
    }
}

fn default_endpoint(region: &str) -> String {
    format!("https://s3.{}.amazonaws.com", region)
}

/// `us-east-1` rejects an explicit location constraint.
fn create_bucket_body(region: &str) -> Option<String> {
    if region == "us-east-1" {
        return None;
    }
    Some(format!(
        "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
         <LocationConstraint>{}</LocationConstraint>\
         </CreateBucketConfiguration>",
        region
    ))
}

/// Bucket names from a ListBuckets (`ListAllMyBucketsResult`) response.
pub fn parse_bucket_names(xml: &str) -> Result<Vec<String>> {
    let document = roxmltree::Document::parse(xml).map_err(|e| {
        Error::storage_request_failed(StorageRequestFailedDetails {
            operation: "ListBuckets".to_string(),
            status: None,
            aws_code: None,
            error: format!("Malformed response: {}", e),
        })
    })?;

    Ok(document
        .descendants()
        .filter(|node| node.has_tag_name("Bucket"))
        .filter_map(|bucket| child_text(bucket, "Name"))
        .collect())
}

/// `Code` and `Message` from an S3 `<Error>` body; both absent if the body
/// is not XML.
fn parse_error(xml: &str) -> (Option<String>, Option<String>) {
    let Ok(document) = roxmltree::Document::parse(xml) else {
        return (None, None);
    };
    let root = document.root_element();
    (child_text(root, "Code"), child_text(root, "Message"))
}

fn child_text(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(name))
        .and_then(|child| child.text())
        .map(|text| text.trim().to_string())
}
