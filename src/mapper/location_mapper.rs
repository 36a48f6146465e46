//! The persistent legacy-address -> versioned-address map.
//!
//! One mapper instance is shared by everything that needs to translate
//! addresses during a migration. It is always passed in explicitly; there is
//! no ambient global. Entries are created lazily and never rewritten: once a
//! usage id has been handed out for a map key, that key resolves to the same
//! usage id forever.

use std::collections::HashMap;

use log::debug;

use crate::types::{
    BlockLocator, Branch, LegacyAddress, MigrateError, MigrateResult, UsageId,
};

/// Map key for one block entry.
///
/// Keyed by the published flag in addition to the node coordinates: the same
/// legacy name may map differently depending on which side of the tree it
/// came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BlockKey {
    old_course_id: String,
    category: String,
    name: String,
    published: bool,
}

/// Bidirectional, lazily-populated address map.
#[derive(Debug, Default)]
pub struct LocationMapper {
    /// Legacy course address (published form) -> target course id.
    courses: HashMap<LegacyAddress, String>,
    /// Legacy course id -> target course id, for translate-time lookup.
    course_ids: HashMap<String, String>,
    /// Block entries. Usage ids never change once recorded.
    blocks: HashMap<BlockKey, UsageId>,
}

impl LocationMapper {
    /// Create an empty mapper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or retrieve) the target course id for a legacy course.
    ///
    /// Idempotent with first-write-wins semantics: the first call for a given
    /// course address fixes the mapping; later calls return the same id. An
    /// `explicit_id` that conflicts with a previously chosen id fails with
    /// `DuplicateMapping`.
    pub fn create_course_mapping(
        &mut self,
        course_address: &LegacyAddress,
        explicit_id: Option<&str>,
    ) -> MigrateResult<String> {
        let key = course_address.as_published();
        if let Some(existing) = self.courses.get(&key) {
            if let Some(requested) = explicit_id {
                if requested != existing {
                    return Err(MigrateError::DuplicateMapping {
                        course: key,
                        existing: existing.clone(),
                        requested: requested.to_string(),
                    });
                }
            }
            return Ok(existing.clone());
        }

        let new_id = match explicit_id {
            Some(id) => id.to_string(),
            None => default_course_id(&key),
        };
        debug!("mapping course {} -> {}", key, new_id);
        self.course_ids.insert(key.course_id(), new_id.clone());
        self.courses.insert(key, new_id.clone());
        Ok(new_id)
    }

    /// Look up the target course id for a legacy course without creating it.
    pub fn course_id_for(&self, course_address: &LegacyAddress) -> Option<String> {
        self.courses.get(&course_address.as_published()).cloned()
    }

    /// Translate a legacy address into a versioned-store locator.
    ///
    /// `published` selects which side's map entry is consulted (and which
    /// branch the returned locator names). With `create_if_missing`, a new
    /// entry is synthesized and recorded; otherwise an unmapped address fails
    /// with `AddressNotFound`.
    pub fn translate(
        &mut self,
        old_course_id: &str,
        address: &LegacyAddress,
        published: bool,
        create_if_missing: bool,
    ) -> MigrateResult<BlockLocator> {
        let new_course_id = self
            .course_ids
            .get(old_course_id)
            .cloned()
            .ok_or_else(|| MigrateError::CourseNotFound(old_course_id.to_string()))?;

        let key = BlockKey {
            old_course_id: old_course_id.to_string(),
            category: address.category.clone(),
            name: address.name.clone(),
            published,
        };
        let branch = if published {
            Branch::Published
        } else {
            Branch::Draft
        };

        if let Some(usage_id) = self.blocks.get(&key) {
            return Ok(BlockLocator::new(new_course_id, branch, usage_id.clone()));
        }
        if !create_if_missing {
            return Err(MigrateError::AddressNotFound {
                course_id: old_course_id.to_string(),
                address: address.clone(),
            });
        }

        // Deterministic synthesis: the published and draft entries of one
        // conceptual node receive the same usage id, so a draft translation
        // finds the block its published twin created.
        let usage_id = synthesize_usage_id(&address.category, &address.name);
        debug!(
            "mapping {} ({}) -> {}",
            address,
            if published { "published" } else { "draft" },
            usage_id
        );
        self.blocks.insert(key, usage_id.clone());
        Ok(BlockLocator::new(new_course_id, branch, usage_id))
    }
}

/// Default target course id: `org.course.name` of the course address.
fn default_course_id(course_address: &LegacyAddress) -> String {
    format!(
        "{}.{}.{}",
        sanitize(&course_address.org),
        sanitize(&course_address.course),
        sanitize(&course_address.name)
    )
}

/// Synthesize the usage id for a node: `category.name`, sanitized.
fn synthesize_usage_id(category: &str, name: &str) -> UsageId {
    UsageId::new(format!("{}.{}", sanitize(category), sanitize(name)))
}

/// Replace anything outside `[A-Za-z0-9_-]` with `_`.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
