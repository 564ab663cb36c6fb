//! Resource identifiers
//!
//! A resource id names one cached value. Global resources use the bare name;
//! session-scoped resources append the scope after `@`. Names may not contain
//! `@`, so a scoped id always splits back into exactly one (name, scope) pair
//! and can never equal a global id.

use crate::error::{RescacheError, RescacheResult};
use std::fmt;

/// Separator between a resource name and its session scope
pub const SCOPE_SEPARATOR: char = '@';

/// Stable identifier of one cached resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    /// Create a global (unscoped) resource id
    pub fn new(name: impl Into<String>) -> RescacheResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self(name))
    }

    /// Create a resource id scoped to a session or user
    ///
    /// The scope is free-form; an empty scope is allowed and still differs
    /// from the global id of the same name.
    pub fn scoped(name: impl Into<String>, scope: &str) -> RescacheResult<Self> {
        let mut id = name.into();
        validate_name(&id)?;
        id.push(SCOPE_SEPARATOR);
        id.push_str(scope);
        Ok(Self(id))
    }

    /// Create a global id, or a scoped one when `scope` is present
    pub fn with_scope(name: impl Into<String>, scope: Option<&str>) -> RescacheResult<Self> {
        match scope {
            Some(scope) => Self::scoped(name, scope),
            None => Self::new(name),
        }
    }

    /// The full identifier string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The resource name without its scope
    pub fn name(&self) -> &str {
        self.0
            .split_once(SCOPE_SEPARATOR)
            .map_or(self.0.as_str(), |(name, _)| name)
    }

    /// The session scope, if any
    pub fn scope(&self) -> Option<&str> {
        self.0.split_once(SCOPE_SEPARATOR).map(|(_, scope)| scope)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn validate_name(name: &str) -> RescacheResult<()> {
    if name.is_empty() {
        return Err(RescacheError::invalid_id(name, "name is empty"));
    }
    if name.contains(SCOPE_SEPARATOR) {
        return Err(RescacheError::invalid_id(
            name,
            format!("name contains reserved '{}'", SCOPE_SEPARATOR),
        ));
    }
    Ok(())
}
