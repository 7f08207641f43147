// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod file;
pub mod footprint;
pub mod identity;
pub mod resource;

pub use file::{FileCategory, FileRecord, FileUpload};
pub use footprint::{FootprintAnswers, FootprintResult, Step};
pub use identity::{Identity, ProfileUpdate, Registration, UserProfile};
pub use resource::{NewResource, Resource, ResourceFilter, ResourceType};
