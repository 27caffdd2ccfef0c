// ABOUTME: Stylesheets and scripts injected into a prerendered page
// ABOUTME: Embeds local files or links them; URLs are always linked

use crate::dom::Document;
use crate::errors::{FolioError, Result};
use log::{info, warn};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Stylesheet,
    Script,
}

impl ResourceKind {
    /// Element the resource is appended to.
    fn parent_tag(&self) -> &'static str {
        match self {
            ResourceKind::Stylesheet => "head",
            ResourceKind::Script => "body",
        }
    }
}

/// A stylesheet or script, either a local path or a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFile {
    pub path: String,
    pub kind: ResourceKind,
    pub is_remote: bool,
}

impl ResourceFile {
    pub fn new(path: &str, kind: ResourceKind) -> Self {
        let is_remote = path.starts_with("http://") || path.starts_with("https://");
        Self {
            path: path.to_string(),
            kind,
            is_remote,
        }
    }

    pub fn stylesheet(path: &str) -> Self {
        Self::new(path, ResourceKind::Stylesheet)
    }

    pub fn script(path: &str) -> Self {
        Self::new(path, ResourceKind::Script)
    }

    /// Body of a local resource. Remote resources are only ever linked.
    pub fn content(&self) -> Result<String> {
        if self.is_remote {
            return Err(FolioError::InvalidResourcePath(format!(
                "{} is remote and can only be linked",
                self.path
            )));
        }
        info!("Reading local resource: {}", self.path);
        let path = Path::new(&self.path);
        if !path.exists() {
            return Err(FolioError::PathNotFoundError(path.to_path_buf()));
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Markup for the resource. Remote resources are always linked.
    pub fn tag(&self, embed: bool) -> Result<String> {
        if self.is_remote || !embed {
            return Ok(match self.kind {
                ResourceKind::Stylesheet => {
                    format!(r#"<link rel="stylesheet" href="{}">"#, self.path)
                }
                ResourceKind::Script => format!(r#"<script src="{}"></script>"#, self.path),
            });
        }
        let content = self.content()?;
        Ok(match self.kind {
            ResourceKind::Stylesheet => format!("<style>{}</style>", content),
            ResourceKind::Script => format!("<script>{}</script>", content),
        })
    }
}

/// Append each resource to the page; a resource that cannot be loaded is
/// skipped with a warning. Returns how many were injected.
pub fn inject(doc: &mut Document, resources: &[ResourceFile], embed: bool) -> Result<usize> {
    let mut injected = 0;
    for resource in resources {
        let tag = match resource.tag(embed) {
            Ok(tag) => tag,
            Err(e) => {
                warn!("Failed to include resource {}: {}", resource.path, e);
                continue;
            }
        };
        if doc.append_raw(resource.kind.parent_tag(), &format!("{}\n", tag)) {
            injected += 1;
        } else {
            return Err(FolioError::InvalidResourcePath(format!(
                "page has no <{}> for {}",
                resource.kind.parent_tag(),
                resource.path
            )));
        }
    }
    Ok(injected)
}
