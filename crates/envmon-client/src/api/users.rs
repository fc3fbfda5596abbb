//! Users API.

use crate::client::EnvmonClient;
use crate::error::Result;
use crate::types::{User, UserInput, UserRole};

/// Users API client.
pub struct UsersApi {
    client: EnvmonClient,
}

#[derive(serde::Serialize)]
struct UserRoleQuery {
    usuario: u64,
}

#[derive(serde::Serialize)]
struct AssignRoleRequest {
    usuario: u64,
    rol: u64,
}

impl UsersApi {
    pub(crate) fn new(client: EnvmonClient) -> Self {
        Self { client }
    }

    /// List all users.
    pub async fn list(&self) -> Result<Vec<User>> {
        self.client.get("usuarios/").await
    }

    /// Get a user by ID.
    pub async fn get(&self, id: u64) -> Result<User> {
        self.client.get(&format!("usuarios/{}/", id)).await
    }

    /// Create a new user.
    pub async fn create(&self, user: &UserInput) -> Result<User> {
        self.client.post("usuarios/", user).await
    }

    /// Replace a user.
    pub async fn update(&self, id: u64, user: &UserInput) -> Result<User> {
        self.client.put(&format!("usuarios/{}/", id), user).await
    }

    /// Delete a user.
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client.delete(&format!("usuarios/{}/", id)).await
    }

    /// Role assignments of a user.
    pub async fn roles(&self, user_id: u64) -> Result<Vec<UserRole>> {
        self.client
            .get_with_query("usuarios-roles/", &UserRoleQuery { usuario: user_id })
            .await
    }

    /// Assign a role to a user.
    pub async fn assign_role(&self, user_id: u64, role_id: u64) -> Result<UserRole> {
        self.client
            .post(
                "usuarios-roles/",
                &AssignRoleRequest {
                    usuario: user_id,
                    rol: role_id,
                },
            )
            .await
    }

    /// Remove a role assignment by its own ID.
    pub async fn remove_role(&self, user_role_id: u64) -> Result<()> {
        self.client
            .delete(&format!("usuarios-roles/{}/", user_role_id))
            .await
    }
}
