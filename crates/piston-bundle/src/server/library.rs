/// Maven coordinate handling and library verification
use crate::server::types::LibraryRef;
use anyhow::{anyhow, bail, Context, Result};
use sha1::{Digest, Sha1};
use std::path::Path;
use std::str::FromStr;
use url::Url;

/// Parsed `group:artifact:version[:classifier][@extension]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenCoords {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl FromStr for MavenCoords {
    type Err = anyhow::Error;

    fn from_str(coords: &str) -> Result<Self> {
        let (body, extension) = match coords.rsplit_once('@') {
            Some((body, ext)) if !ext.is_empty() => (body, ext),
            Some(_) => bail!("Invalid Maven coordinates: {}", coords),
            None => (coords, "jar"),
        };

        let parts: Vec<&str> = body.split(':').collect();
        if !(3..=4).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
            bail!("Invalid Maven coordinates: {}", coords);
        }

        Ok(Self {
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier: parts.get(3).map(|c| c.to_string()),
            extension: extension.to_string(),
        })
    }
}

impl MavenCoords {
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(clf) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, clf, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension),
        }
    }

    /// Repository-relative path, always `/`-separated.
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.file_name()
        )
    }
}

/// Convert Maven coordinates to a repository path
/// Example: "com.google.guava:guava:21.0" -> "com/google/guava/guava/21.0/guava-21.0.jar"
pub fn maven_to_path(coords: &str) -> Result<String> {
    Ok(coords.parse::<MavenCoords>()?.path())
}

impl LibraryRef {
    /// Full download URL: the library's own repository (or `default_repo`)
    /// joined with its Maven path.
    pub fn download_url(&self, default_repo: &str) -> Result<Url> {
        let repo = self.url.as_deref().unwrap_or(default_repo);
        let mut base =
            Url::parse(repo).with_context(|| format!("Invalid repository URL: {}", repo))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let relative = maven_to_path(&self.name)?;
        base.join(&relative)
            .map_err(|e| anyhow!("Failed to build URL for {}: {}", self.name, e))
    }
}

/// Lowercase hex SHA-1 of a file
pub async fn file_sha1(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Read {:?} for hashing", path))?;
    let mut hasher = Sha1::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub async fn sha1_matches(path: &Path, expected: &str) -> Result<bool> {
    Ok(file_sha1(path).await?.eq_ignore_ascii_case(expected))
}
