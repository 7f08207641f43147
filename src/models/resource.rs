// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Eco-resource model (recycling points, markets, stores, events).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

use super::identity::not_blank;
use crate::error::AppError;

/// Kind of eco-resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Recycling,
    OrganicMarket,
    BulkStore,
    Event,
}

impl ResourceType {
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Recycling,
        ResourceType::OrganicMarket,
        ResourceType::BulkStore,
        ResourceType::Event,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Recycling => "recycling",
            ResourceType::OrganicMarket => "organic-market",
            ResourceType::BulkStore => "bulk-store",
            ResourceType::Event => "event",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown resource type: {s}"))
    }
}

/// Where a resource is. Coordinates are 0 until geocoding exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Location {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

/// A user-submitted point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Resource {
    /// Assigned by the document store, never changed afterwards
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub description: String,
    pub contact: Option<String>,
    pub location: Location,
}

impl Resource {
    /// Google Maps link for the resource's coordinates.
    pub fn map_link(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}",
            self.location.lat, self.location.lng
        )
    }

    /// Case-insensitive match against name or description.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.description.to_lowercase().contains(&term)
    }
}

/// Resource creation form. Absent fields read as blank so validation
/// reports them per field.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NewResource {
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(custom(function = "known_resource_type", message = "Choose a resource type"))]
    pub resource_type: String,
    #[validate(custom(function = "not_blank", message = "Description is required"))]
    pub description: String,
    pub contact: Option<String>,
    #[validate(custom(function = "not_blank", message = "Address is required"))]
    pub address: String,
}

fn known_resource_type(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<ResourceType>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("resource_type"))
}

/// Resource fields as written to the store, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDraft {
    pub name: String,
    pub resource_type: ResourceType,
    pub description: String,
    pub contact: Option<String>,
    pub location: Location,
}

impl ResourceDraft {
    pub fn with_id(self, id: String) -> Resource {
        Resource {
            id,
            name: self.name,
            resource_type: self.resource_type,
            description: self.description,
            contact: self.contact,
            location: self.location,
        }
    }
}

impl TryFrom<NewResource> for ResourceDraft {
    type Error = AppError;

    fn try_from(input: NewResource) -> Result<Self, Self::Error> {
        let resource_type = input
            .resource_type
            .parse::<ResourceType>()
            .map_err(|e| AppError::field("type", e))?;
        let contact = input
            .contact
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            name: input.name.trim().to_string(),
            resource_type,
            description: input.description.trim().to_string(),
            contact,
            location: Location {
                address: input.address.trim().to_string(),
                lat: 0.0,
                lng: 0.0,
            },
        })
    }
}

/// List filter for the resources page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceFilter {
    #[serde(rename = "type")]
    pub resource_type: Option<ResourceType>,
    pub search: Option<String>,
}

impl ResourceFilter {
    pub fn apply(&self, resources: Vec<Resource>) -> Vec<Resource> {
        resources
            .into_iter()
            .filter(|r| self.resource_type.map_or(true, |t| r.resource_type == t))
            .filter(|r| {
                self.search
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map_or(true, |s| r.matches_search(s))
            })
            .collect()
    }
}
