// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod files;
pub mod footprint;
pub mod identity;
pub mod resources;
pub mod session;
pub mod snapshot;

pub use files::FileCatalog;
pub use identity::{FirebaseAuthClient, IdentityProvider, MemoryIdentityProvider};
pub use resources::ResourceCatalog;
pub use session::{IdentityEvent, SessionManager};
pub use snapshot::CollectionSnapshots;
