//! Addressing vocabulary for both stores.
//!
//! The legacy store is location-addressed: a node is named by
//! `(org, course, category, name)` plus an optional revision marking the
//! draft copy. The versioned store is branch-addressed: a block is named by a
//! course id, a branch, and a usage id that stays stable across structure
//! versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MigrateError;

/// URL scheme prefix of a rendered legacy address.
pub const LEGACY_SCHEME: &str = "i4x://";

/// Revision marker on a legacy address.
///
/// A missing revision names the published copy; `Draft` names the mutable
/// draft copy of the same conceptual node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Revision {
    /// The draft copy of a node.
    Draft,
}

/// A location in the legacy content tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegacyAddress {
    /// Organization that owns the course.
    pub org: String,
    /// Course code within the organization.
    pub course: String,
    /// Node category ("course", "chapter", "html", ...).
    pub category: String,
    /// Node name, unique within (course, category).
    pub name: String,
    /// `None` for the published copy, `Some(Draft)` for the draft copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<Revision>,
}

impl LegacyAddress {
    /// Create a published-copy address.
    pub fn new(
        org: impl Into<String>,
        course: impl Into<String>,
        category: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            org: org.into(),
            course: course.into(),
            category: category.into(),
            name: name.into(),
            revision: None,
        }
    }

    /// Return the same address with the draft revision set.
    pub fn as_draft(&self) -> Self {
        Self {
            revision: Some(Revision::Draft),
            ..self.clone()
        }
    }

    /// Return the same address with no revision (the published copy).
    pub fn as_published(&self) -> Self {
        Self {
            revision: None,
            ..self.clone()
        }
    }

    /// Whether this address names a draft copy.
    pub fn is_draft(&self) -> bool {
        self.revision == Some(Revision::Draft)
    }

    /// The legacy course id for a course-category address: `org/course/name`.
    ///
    /// Only meaningful when `category == "course"`; for other nodes the course
    /// run is not part of the address and the caller must thread the course id
    /// through separately.
    pub fn course_id(&self) -> String {
        format!("{}/{}/{}", self.org, self.course, self.name)
    }

    /// Whether two addresses name the same conceptual node, ignoring revision.
    pub fn same_node(&self, other: &LegacyAddress) -> bool {
        self.org == other.org
            && self.course == other.course
            && self.category == other.category
            && self.name == other.name
    }
}

impl fmt::Display for LegacyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}/{}/{}/{}",
            LEGACY_SCHEME, self.org, self.course, self.category, self.name
        )?;
        if self.is_draft() {
            write!(f, "@draft")?;
        }
        Ok(())
    }
}

impl FromStr for LegacyAddress {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(LEGACY_SCHEME)
            .ok_or_else(|| MigrateError::BadAddress(s.to_string()))?;
        let (body, revision) = match body.strip_suffix("@draft") {
            Some(rest) => (rest, Some(Revision::Draft)),
            None => (body, None),
        };
        let parts: Vec<&str> = body.split('/').collect();
        if parts.len() != 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(MigrateError::BadAddress(s.to_string()));
        }
        Ok(Self {
            org: parts[0].to_string(),
            course: parts[1].to_string(),
            category: parts[2].to_string(),
            name: parts[3].to_string(),
            revision,
        })
    }
}

/// A named branch of a course in the versioned store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    /// The published (live) branch.
    Published,
    /// The draft (editing) branch.
    Draft,
}

impl Branch {
    /// Return the branch name as stored in the course index.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Draft => "draft",
        }
    }

    /// Parse a branch from its index name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "published" => Some(Self::Published),
            "draft" => Some(Self::Draft),
            _ => None,
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable per-course block identifier, invariant across structure versions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageId(String);

impl UsageId {
    /// Wrap an already-synthesized usage id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UsageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one immutable structure version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(Uuid);

impl VersionId {
    /// Mint a fresh version id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VersionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A block address in the versioned store: course + branch + usage id.
///
/// The owning structure version is resolved through the course index at read
/// time; usage ids are stable across versions, so a locator stays valid as new
/// versions are cut.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockLocator {
    /// Target course id.
    pub course_id: String,
    /// Branch within the course.
    pub branch: Branch,
    /// Stable block id within the course.
    pub usage_id: UsageId,
}

impl BlockLocator {
    /// Create a locator.
    pub fn new(course_id: impl Into<String>, branch: Branch, usage_id: UsageId) -> Self {
        Self {
            course_id: course_id.into(),
            branch,
            usage_id,
        }
    }

    /// The same locator on another branch.
    pub fn on_branch(&self, branch: Branch) -> Self {
        Self {
            branch,
            ..self.clone()
        }
    }
}

impl fmt::Display for BlockLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}+{}", self.course_id, self.branch, self.usage_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_roundtrip() {
        let addr = LegacyAddress::new("edX", "CS101", "chapter", "week1");
        let rendered = addr.to_string();
        assert_eq!(rendered, "i4x://edX/CS101/chapter/week1");
        assert_eq!(rendered.parse::<LegacyAddress>().unwrap(), addr);
    }

    #[test]
    fn test_draft_suffix_roundtrip() {
        let addr = LegacyAddress::new("edX", "CS101", "html", "intro").as_draft();
        let rendered = addr.to_string();
        assert_eq!(rendered, "i4x://edX/CS101/html/intro@draft");
        let parsed: LegacyAddress = rendered.parse().unwrap();
        assert!(parsed.is_draft());
        assert!(parsed.same_node(&addr.as_published()));
    }

    #[test]
    fn test_bad_addresses_rejected() {
        assert!("http://edX/CS101/chapter/week1".parse::<LegacyAddress>().is_err());
        assert!("i4x://edX/CS101/chapter".parse::<LegacyAddress>().is_err());
        assert!("i4x://edX//chapter/week1".parse::<LegacyAddress>().is_err());
    }

    #[test]
    fn test_course_id() {
        let addr = LegacyAddress::new("edX", "CS101", "course", "2013");
        assert_eq!(addr.course_id(), "edX/CS101/2013");
    }

    #[test]
    fn test_branch_names() {
        assert_eq!(Branch::Published.as_str(), "published");
        assert_eq!(Branch::from_name("draft"), Some(Branch::Draft));
        assert_eq!(Branch::from_name("release"), None);
    }
}
