use std::error::Error;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, Secret};
use serde_json::json;

use crate::common::configuration::DirectorySettings;
use crate::common::helpers::err_to_boxed_send_sync;
use crate::domain::models::directory::{Member, Role};

use super::Directory;

/// Directory client speaking to the platform's REST API.
#[derive(Debug)]
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: String,
    token: Secret<String>,
}

impl HttpDirectory {
    pub fn new(settings: &DirectorySettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.clone(),
            token: settings.token.clone(),
        }
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn create_role(
        &self,
        name: &str,
        reason: &str,
    ) -> Result<Role, Box<dyn Error + Send + Sync>> {
        let response = self
            .client
            .post(format!("{}/roles", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .json(&json!({ "name": name, "reason": reason }))
            .send()
            .await
            .map_err(err_to_boxed_send_sync)?
            .error_for_status()
            .map_err(err_to_boxed_send_sync)?;
        response.json::<Role>().await.map_err(err_to_boxed_send_sync)
    }

    async fn delete_role(
        &self,
        role_id: &str,
        reason: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.client
            .delete(format!("{}/roles/{}", self.base_url, role_id))
            .bearer_auth(self.token.expose_secret())
            .json(&json!({ "reason": reason }))
            .send()
            .await
            .map_err(err_to_boxed_send_sync)?
            .error_for_status()
            .map_err(err_to_boxed_send_sync)?;
        Ok(())
    }

    async fn fetch_role(
        &self,
        role_id: &str,
    ) -> Result<Option<Role>, Box<dyn Error + Send + Sync>> {
        let response = self
            .client
            .get(format!("{}/roles/{}", self.base_url, role_id))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(err_to_boxed_send_sync)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status().map_err(err_to_boxed_send_sync)?;
        let role = response.json::<Role>().await.map_err(err_to_boxed_send_sync)?;
        Ok(Some(role))
    }

    async fn fetch_member(
        &self,
        user_id: &str,
    ) -> Result<Option<Member>, Box<dyn Error + Send + Sync>> {
        let response = self
            .client
            .get(format!("{}/members/{}", self.base_url, user_id))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(err_to_boxed_send_sync)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status().map_err(err_to_boxed_send_sync)?;
        let member = response
            .json::<Member>()
            .await
            .map_err(err_to_boxed_send_sync)?;
        Ok(Some(member))
    }

    async fn assign_role(
        &self,
        member: &Member,
        role: &Role,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.client
            .put(format!(
                "{}/members/{}/roles/{}",
                self.base_url, member.id, role.id
            ))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(err_to_boxed_send_sync)?
            .error_for_status()
            .map_err(err_to_boxed_send_sync)?;
        Ok(())
    }

    async fn remove_role(
        &self,
        member: &Member,
        role: &Role,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.client
            .delete(format!(
                "{}/members/{}/roles/{}",
                self.base_url, member.id, role.id
            ))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(err_to_boxed_send_sync)?
            .error_for_status()
            .map_err(err_to_boxed_send_sync)?;
        Ok(())
    }
}
