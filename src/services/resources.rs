// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resource catalog: user-owned eco-resources.

use std::sync::Arc;

use validator::Validate;

use crate::db::ResourceRepository;
use crate::error::AppError;
use crate::models::resource::{NewResource, Resource, ResourceDraft, ResourceFilter};

/// CRUD over the resources in each user's partition.
#[derive(Clone)]
pub struct ResourceCatalog {
    repo: Arc<dyn ResourceRepository>,
}

impl ResourceCatalog {
    pub fn new(repo: Arc<dyn ResourceRepository>) -> Self {
        Self { repo }
    }

    /// Resources in store order, narrowed by `filter`.
    pub async fn list(
        &self,
        user_id: &str,
        filter: &ResourceFilter,
    ) -> Result<Vec<Resource>, AppError> {
        let resources = self.repo.list_resources(user_id).await?;
        Ok(filter.apply(resources))
    }

    /// Validate and insert a resource. Invalid input writes nothing.
    pub async fn create(&self, user_id: &str, input: NewResource) -> Result<Resource, AppError> {
        input.validate()?;

        let draft = ResourceDraft::try_from(input)?;
        let resource = self.repo.insert_resource(user_id, &draft).await?;

        tracing::info!(
            user_id,
            resource_id = %resource.id,
            resource_type = %resource.resource_type,
            "Resource created"
        );
        Ok(resource)
    }

    /// Delete a resource. Unknown ids are a no-op.
    pub async fn delete(&self, user_id: &str, resource_id: &str) -> Result<(), AppError> {
        self.repo.delete_resource(user_id, resource_id).await?;
        tracing::info!(user_id, resource_id, "Resource deleted");
        Ok(())
    }
}
