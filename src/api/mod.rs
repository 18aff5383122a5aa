//! Users REST API: wire records and the client seam.
//!
//! [`UsersApi`] is what the store talks to. [`HttpUsersApi`] implements it
//! on top of `reqwest`; tests plug in in-memory fakes.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;

pub use http::HttpUsersApi;

/// A user record as returned by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Centimetres.
    #[serde(default, deserialize_with = "number_or_zero")]
    pub height: f64,
    /// Kilograms.
    #[serde(default, deserialize_with = "number_or_zero")]
    pub weight: f64,
    pub gender: String,
    pub residence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// Records saved from an empty numeric input come back with `null`.
fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Editable attributes of this record, e.g. to pre-fill a form.
    pub fn to_payload(&self) -> NewOrUpdateUser {
        NewOrUpdateUser {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            height: self.height,
            weight: self.weight,
            gender: self.gender.clone(),
            residence: self.residence.clone(),
            photo: self.photo.clone(),
        }
    }
}

/// Body of create and update calls. Sent as-is, nothing is validated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrUpdateUser {
    pub first_name: String,
    pub last_name: String,
    pub height: f64,
    pub weight: f64,
    pub gender: String,
    pub residence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl NewOrUpdateUser {
    /// Attach a server-assigned id.
    pub fn into_user(self, id: impl Into<String>) -> User {
        User {
            id: id.into(),
            first_name: self.first_name,
            last_name: self.last_name,
            height: self.height,
            weight: self.weight,
            gender: self.gender,
            residence: self.residence,
            photo: self.photo,
        }
    }
}

/// One page of the list endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UsersPage {
    pub results: Vec<User>,
    pub page: u32,
    pub total_pages: u32,
    pub total_users: u64,
}

/// Reachability of a user's photo URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhotoStatus {
    /// The user has no photo URL.
    Missing,
    Checking,
    Available,
    Unavailable,
}

impl PhotoStatus {
    pub fn label(self) -> &'static str {
        match self {
            PhotoStatus::Missing => "no photo",
            PhotoStatus::Checking => "checking photo...",
            PhotoStatus::Available => "photo available",
            PhotoStatus::Unavailable => "photo unavailable",
        }
    }
}

/// Calls the store needs from the remote users service.
#[async_trait]
pub trait UsersApi: Send + Sync {
    /// GET `/users?page={page}&pageSize={page_size}`
    async fn list_users(&self, page: u32, page_size: u32) -> Result<UsersPage, ApiError>;

    /// GET `/users/{id}`
    async fn get_user(&self, id: &str) -> Result<User, ApiError>;

    /// POST `/users`
    async fn create_user(&self, payload: &NewOrUpdateUser) -> Result<User, ApiError>;

    /// PATCH `/users/{id}`
    async fn update_user(&self, id: &str, payload: &NewOrUpdateUser) -> Result<User, ApiError>;

    /// DELETE `/users/{id}`. The response body is ignored.
    async fn delete_user(&self, id: &str) -> Result<(), ApiError>;

    /// Check whether a photo URL answers with a 2xx.
    async fn probe_photo(&self, url: &str) -> PhotoStatus {
        let _ = url;
        PhotoStatus::Unavailable
    }
}
