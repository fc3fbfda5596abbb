//! Roles API.

use crate::client::EnvmonClient;
use crate::error::Result;
use crate::types::{Role, RoleInput};

/// Roles API client.
pub struct RolesApi {
    client: EnvmonClient,
}

impl RolesApi {
    pub(crate) fn new(client: EnvmonClient) -> Self {
        Self { client }
    }

    /// List all roles.
    pub async fn list(&self) -> Result<Vec<Role>> {
        self.client.get("roles/").await
    }

    /// Get a role by ID.
    pub async fn get(&self, id: u64) -> Result<Role> {
        self.client.get(&format!("roles/{}/", id)).await
    }

    /// Create a new role.
    pub async fn create(&self, role: &RoleInput) -> Result<Role> {
        self.client.post("roles/", role).await
    }

    /// Replace a role.
    pub async fn update(&self, id: u64, role: &RoleInput) -> Result<Role> {
        self.client.put(&format!("roles/{}/", id), role).await
    }

    /// Delete a role.
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client.delete(&format!("roles/{}/", id)).await
    }
}
