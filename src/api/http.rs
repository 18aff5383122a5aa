//! `reqwest` implementation of [`UsersApi`].

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{NewOrUpdateUser, PhotoStatus, User, UsersApi, UsersPage};
use crate::error::ApiError;

/// Users API reached over HTTP at a configured base URL.
#[derive(Clone, Debug)]
pub struct HttpUsersApi {
    client: Client,
    base_url: Url,
}

impl HttpUsersApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Use a preconfigured client (proxies, custom TLS roots, ...).
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ApiError> {
        let invalid = |reason: String| ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };
        let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", parsed.scheme())));
        }
        if parsed.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }
        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/users[/{id}]`, keeping any path prefix of the base URL.
    fn route(&self, id: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| ApiError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "not a base URL".to_string(),
            })?;
            segments.pop_if_empty().push("users");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

/// Map a response to a decoded body or an [`ApiError`].
///
/// `not_found` names the id of a by-id route so a 404 becomes
/// [`ApiError::NotFound`] instead of a plain status error.
async fn read_json<T: DeserializeOwned>(
    response: Response,
    what: &'static str,
    not_found: Option<&str>,
) -> Result<T, ApiError> {
    check_status(&response, not_found)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode { what, source })
}

fn check_status(response: &Response, not_found: Option<&str>) -> Result<(), ApiError> {
    match (response.status(), not_found) {
        (StatusCode::NOT_FOUND, Some(id)) => Err(ApiError::NotFound { id: id.to_string() }),
        _ => Ok(()),
    }
}

#[async_trait]
impl UsersApi for HttpUsersApi {
    async fn list_users(&self, page: u32, page_size: u32) -> Result<UsersPage, ApiError> {
        let url = self.route(None)?;
        debug!(%url, page, page_size, "GET users page");
        let response = self
            .client
            .get(url)
            .query(&[("page", page), ("pageSize", page_size)])
            .send()
            .await?;
        read_json(response, "UsersPage", None).await
    }

    async fn get_user(&self, id: &str) -> Result<User, ApiError> {
        let url = self.route(Some(id))?;
        debug!(%url, "GET user");
        let response = self.client.get(url).send().await?;
        read_json(response, "User", Some(id)).await
    }

    async fn create_user(&self, payload: &NewOrUpdateUser) -> Result<User, ApiError> {
        let url = self.route(None)?;
        debug!(%url, "POST user");
        let response = self.client.post(url).json(payload).send().await?;
        read_json(response, "User", None).await
    }

    async fn update_user(&self, id: &str, payload: &NewOrUpdateUser) -> Result<User, ApiError> {
        let url = self.route(Some(id))?;
        debug!(%url, "PATCH user");
        let response = self.client.patch(url).json(payload).send().await?;
        read_json(response, "User", Some(id)).await
    }

    async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        let url = self.route(Some(id))?;
        debug!(%url, "DELETE user");
        let response = self.client.delete(url).send().await?;
        check_status(&response, Some(id))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn probe_photo(&self, url: &str) -> PhotoStatus {
        match self.client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => PhotoStatus::Available,
            Ok(resp) => {
                debug!(url, status = resp.status().as_u16(), "photo not reachable");
                PhotoStatus::Unavailable
            }
            Err(e) => {
                warn!(url, error = %e, "photo probe failed");
                PhotoStatus::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_keep_the_base_path() {
        let api = HttpUsersApi::new("http://localhost:3000/api/").unwrap();
        assert_eq!(
            api.route(None).unwrap().as_str(),
            "http://localhost:3000/api/users"
        );
        assert_eq!(
            api.route(Some("abc")).unwrap().as_str(),
            "http://localhost:3000/api/users/abc"
        );
    }

    #[test]
    fn ids_are_escaped_as_one_segment() {
        let api = HttpUsersApi::new("http://localhost:3000").unwrap();
        assert_eq!(
            api.route(Some("a/b")).unwrap().as_str(),
            "http://localhost:3000/users/a%2Fb"
        );
    }

    #[test]
    fn rejects_non_http_base_urls() {
        assert!(matches!(
            HttpUsersApi::new("ftp://example.com"),
            Err(ApiError::InvalidUrl { .. })
        ));
        assert!(matches!(
            HttpUsersApi::new("not a url"),
            Err(ApiError::InvalidUrl { .. })
        ));
    }
}
