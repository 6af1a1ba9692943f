//! Container image reference pinning
//!
//! Dockerfiles are rewritten on their `FROM` lines, Kubernetes manifests and
//! compose files on their `image:` keys. A pinned reference keeps its tag for
//! readability: `nginx:1.25` becomes `nginx:1.25@sha256:…`.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use globset::GlobSet;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use super::actions::{is_yaml, split_line_ending};
use super::{build_globset, filesystem, ScanCategory, Scanner};
use crate::error::{ResolveError, ScanError};
use crate::results::ScanResult;

lazy_static! {
    static ref FROM_LINE: Regex =
        Regex::new(r"(?i)^(?P<prefix>\s*FROM\s+(?:--platform=\S+\s+)?)(?P<image>\S+)(?P<rest>.*)$")
            .unwrap();
    static ref STAGE_ALIAS: Regex = Regex::new(r"(?i)^\s+AS\s+(?P<alias>\S+)").unwrap();
    static ref IMAGE_LINE: Regex = Regex::new(
        r#"^(?P<prefix>\s*(?:-\s+)?image:\s*)(?P<open>["']?)(?P<image>[^\s"'#]+)(?P<close>["']?)(?P<rest>.*)$"#
    )
    .unwrap();
}

const DOCKER_HUB: &str = "docker.io";
const DOCKER_HUB_HOST: &str = "registry-1.docker.io";
const DEFAULT_TAG: &str = "latest";

/// A container image reference as written in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    /// Image name including any registry host (`ghcr.io/org/app`)
    pub name: String,
    /// Explicit tag, if any
    pub tag: Option<String>,
    /// Explicit digest, if any
    pub digest: Option<String>,
}

impl ImageRef {
    /// Parse `name[:tag][@digest]`
    ///
    /// Returns `None` for references that are templated (`$VAR`, `{{ }}`)
    /// and cannot be resolved statically.
    pub fn parse(reference: &str) -> Option<Self> {
        if reference.is_empty() || reference.contains('$') || reference.contains("{{") {
            return None;
        }

        let (rest, digest) = match reference.split_once('@') {
            Some((rest, digest)) => (rest, Some(digest.to_string())),
            None => (reference, None),
        };

        let last_slash = rest.rfind('/');
        let (name, tag) = match rest.rfind(':') {
            Some(colon) if last_slash.map_or(true, |slash| colon > slash) => {
                (&rest[..colon], Some(rest[colon + 1..].to_string()))
            }
            _ => (rest, None),
        };

        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            tag,
            digest,
        })
    }

    /// The tag to resolve, `latest` when none is written
    pub fn tag_or_latest(&self) -> &str {
        self.tag.as_deref().unwrap_or(DEFAULT_TAG)
    }

    /// Registry the image lives in, `docker.io` for short names
    pub fn registry(&self) -> &str {
        match self.name.split_once('/') {
            Some((first, _)) if is_registry_host(first) => first,
            _ => DOCKER_HUB,
        }
    }

    /// Host to talk to for the registry API
    pub fn registry_host(&self) -> &str {
        match self.registry() {
            DOCKER_HUB | "index.docker.io" => DOCKER_HUB_HOST,
            other => other,
        }
    }

    /// Repository path inside the registry (`library/nginx` for `nginx`)
    pub fn repository(&self) -> String {
        let path = match self.name.split_once('/') {
            Some((first, rest)) if is_registry_host(first) => rest,
            _ => self.name.as_str(),
        };

        if self.registry_host() == DOCKER_HUB_HOST && !path.contains('/') {
            format!("library/{}", path)
        } else {
            path.to_string()
        }
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.tag_or_latest())?;
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

fn is_registry_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

/// Resolves image tags to manifest digests
#[async_trait]
pub trait DigestResolver: Send + Sync {
    /// Resolve the tag of `image`, `None` if the registry has no such tag
    async fn resolve(&self, image: &ImageRef) -> Result<Option<String>, ResolveError>;
}

/// Exclusions applied to image references
#[derive(Debug, Clone)]
pub struct ImageExclusions {
    images: GlobSet,
    tags: GlobSet,
}

impl ImageExclusions {
    /// Compile the excluded image names and tags
    pub fn new(images: &[String], tags: &[String]) -> Result<Self, ScanError> {
        Ok(Self {
            images: build_globset(images)?,
            tags: build_globset(tags)?,
        })
    }
}

/// Pins container image references for one manifest category
pub struct ImagesScanner {
    root: PathBuf,
    category: ScanCategory,
    resolver: Arc<dyn DigestResolver>,
    exclusions: ImageExclusions,
}

type DigestCache = HashMap<(String, String), Option<String>>;

impl ImagesScanner {
    /// Create a new scanner for `category` in the repository at `root`
    pub fn new(
        root: impl Into<PathBuf>,
        category: ScanCategory,
        resolver: Arc<dyn DigestResolver>,
        exclusions: ImageExclusions,
    ) -> Self {
        Self {
            root: root.into(),
            category,
            resolver,
            exclusions,
        }
    }

    fn accepts(&self, path: &str) -> bool {
        match self.category {
            ScanCategory::Dockerfiles => is_dockerfile(path),
            _ => is_yaml(path),
        }
    }

    async fn rewrite(&self, path: &str, content: &str, cache: &mut DigestCache) -> Option<String> {
        let dockerfile = self.category == ScanCategory::Dockerfiles;
        let mut stages = HashSet::new();
        let mut changed = false;
        let mut output = String::with_capacity(content.len());

        for line in content.split_inclusive('\n') {
            let (body, ending) = split_line_ending(line);
            let rewritten = if dockerfile {
                self.rewrite_from(path, body, &mut stages, cache).await
            } else {
                self.rewrite_image_key(path, body, cache).await
            };

            match rewritten {
                Some(new_body) => {
                    changed = true;
                    output.push_str(&new_body);
                }
                None => output.push_str(body),
            }
            output.push_str(ending);
        }

        changed.then_some(output)
    }

    async fn rewrite_from(
        &self,
        path: &str,
        line: &str,
        stages: &mut HashSet<String>,
        cache: &mut DigestCache,
    ) -> Option<String> {
        let caps = FROM_LINE.captures(line)?;
        let image = &caps["image"];
        let rest = &caps["rest"];

        let is_stage = stages.contains(&image.to_lowercase());
        if let Some(alias) = STAGE_ALIAS.captures(rest) {
            stages.insert(alias["alias"].to_lowercase());
        }
        if is_stage {
            return None;
        }

        let pinned = self.pin(path, image, cache).await?;
        Some(format!("{}{}{}", &caps["prefix"], pinned, rest))
    }

    async fn rewrite_image_key(
        &self,
        path: &str,
        line: &str,
        cache: &mut DigestCache,
    ) -> Option<String> {
        let caps = IMAGE_LINE.captures(line)?;
        let pinned = self.pin(path, &caps["image"], cache).await?;
        Some(format!(
            "{}{}{}{}{}",
            &caps["prefix"],
            &caps["open"],
            pinned,
            &caps["close"],
            &caps["rest"]
        ))
    }

    /// The pinned form of `reference`, `None` if it stays as written
    async fn pin(&self, path: &str, reference: &str, cache: &mut DigestCache) -> Option<String> {
        let image = ImageRef::parse(reference)?;
        if image.digest.is_some() {
            return None;
        }
        if self.exclusions.images.is_match(&image.name) {
            debug!(image = %image.name, "Image excluded");
            return None;
        }
        let tag = image.tag_or_latest().to_string();
        if self.exclusions.tags.is_match(&tag) {
            debug!(image = %image.name, tag = %tag, "Tag excluded");
            return None;
        }

        let key = (image.name.clone(), tag.clone());
        let cached = cache.get(&key).cloned();
        let digest = match cached {
            Some(cached) => cached,
            None => {
                let digest = match self.resolver.resolve(&image).await {
                    Ok(Some(digest)) => Some(digest),
                    Ok(None) => {
                        warn!(file = path, image = %image, "Image tag not found in registry");
                        None
                    }
                    Err(e) => {
                        warn!(file = path, image = %image, error = %e, "Failed to resolve image digest");
                        None
                    }
                };
                cache.insert(key, digest.clone());
                digest
            }
        }?;

        Some(format!("{}:{}@{}", image.name, tag, digest))
    }
}

#[async_trait]
impl Scanner for ImagesScanner {
    fn category(&self) -> ScanCategory {
        self.category
    }

    async fn scan(&self, path: &str) -> Result<ScanResult, ScanError> {
        let mut result = ScanResult::new();
        let mut cache = DigestCache::new();

        for file in filesystem::walk_path(&self.root, path)? {
            if !self.accepts(&file) {
                continue;
            }

            let content = std::fs::read_to_string(self.root.join(&file)).map_err(|source| {
                ScanError::FileRead {
                    path: file.clone(),
                    source,
                }
            })?;

            match self.rewrite(&file, &content, &mut cache).await {
                Some(rewritten) => result.add_modified(file, rewritten),
                None => result.add_processed(file),
            }
        }

        Ok(result)
    }
}

fn is_dockerfile(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if file_name.ends_with(".md") {
        return false;
    }
    file_name.starts_with("Dockerfile")
        || file_name.starts_with("Containerfile")
        || file_name.ends_with(".dockerfile")
}
