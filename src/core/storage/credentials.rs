use std::path::PathBuf;

use crate::error::{Error, Result};

/// AWS access keys used to sign storage requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Resolve credentials from the environment, then the shared credentials file.
pub fn resolve_credentials() -> Result<Credentials> {
    if let Some(creds) = from_lookup(|key| std::env::var(key).ok()) {
        return Ok(creds);
    }

    let profile = std::env::var("AWS_PROFILE").unwrap_or_else(|_| "default".to_string());
    let path = credentials_file();
    if let Ok(content) = std::fs::read_to_string(&path) {
        if let Some(creds) = parse_profile(&content, &profile) {
            return Ok(creds);
        }
    }

    Err(Error::storage_credentials_missing(profile))
}

fn credentials_file() -> PathBuf {
    match std::env::var("AWS_SHARED_CREDENTIALS_FILE") {
        Ok(path) => PathBuf::from(shellexpand::tilde(&path).to_string()),
        Err(_) => PathBuf::from(shellexpand::tilde("~/.aws/credentials").to_string()),
    }
}

fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Option<Credentials> {
    let access_key_id = get("AWS_ACCESS_KEY_ID").filter(|v| !v.is_empty())?;
    let secret_access_key = get("AWS_SECRET_ACCESS_KEY").filter(|v| !v.is_empty())?;
    Some(Credentials {
        access_key_id,
        secret_access_key,
        session_token: get("AWS_SESSION_TOKEN").filter(|v| !v.is_empty()),
    })
}

/// Read one `[profile]` section of an INI-style credentials file.
pub(crate) fn parse_profile(content: &str, profile: &str) -> Option<Credentials> {
    let mut in_section = false;
    let mut access_key_id = None;
    let mut secret_access_key = None;
    let mut session_token = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = section.trim() == profile;
            continue;
        }
        if !in_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "aws_access_key_id" => access_key_id = Some(value),
            "aws_secret_access_key" => secret_access_key = Some(value),
            "aws_session_token" => session_token = Some(value),
            _ => {}
        }
    }

    Some(Credentials {
        access_key_id: access_key_id?,
        secret_access_key: secret_access_key?,
        session_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const FILE: &str = "\
[default]
aws_access_key_id = AKIDDEFAULT
aws_secret_access_key = secret-default

# staging keys
[staging]
aws_access_key_id=AKIDSTAGING
aws_secret_access_key=secret-staging
aws_session_token=token
";

    #[test]
    fn parses_named_profile() {
        let creds = parse_profile(FILE, "staging").unwrap();
        assert_eq!(creds.access_key_id, "AKIDSTAGING");
        assert_eq!(creds.secret_access_key, "secret-staging");
        assert_eq!(creds.session_token.as_deref(), Some("token"));
    }

    #[test]
    fn default_profile_has_no_token() {
        let creds = parse_profile(FILE, "default").unwrap();
        assert_eq!(creds.access_key_id, "AKIDDEFAULT");
        assert!(creds.session_token.is_none());
    }

    #[test]
    fn unknown_profile_is_none() {
        assert!(parse_profile(FILE, "prod").is_none());
    }

    #[test]
    fn env_lookup_requires_both_keys() {
        let env: HashMap<&str, &str> = [("AWS_ACCESS_KEY_ID", "AKID")].into_iter().collect();
        assert!(from_lookup(|k| env.get(k).map(|v| v.to_string())).is_none());

        let env: HashMap<&str, &str> = [
            ("AWS_ACCESS_KEY_ID", "AKID"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]
        .into_iter()
        .collect();
        let creds = from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(creds.access_key_id, "AKID");
    }

    #[test]
    fn debug_redacts_secret() {
        let creds = parse_profile(FILE, "default").unwrap();
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("secret-default"));
    }
}
