//! Account, profile and image upload operations

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::{Gateway, GatewayError, GatewayResult};
use crate::backend::{tables, AuthUser, Query, Registration};
use crate::profile::Profile;
use crate::Error;

impl Gateway {
    pub async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<AuthUser> {
        let auth = self.auth.as_ref();
        let user = self
            .run("auth.sign_in", move || async move {
                auth.sign_in(email, password).await
            })
            .await?;
        info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    /// Create an account and its profile row.
    ///
    /// The profile insert runs separately from the sign-up; if it fails the
    /// account exists without a profile and [`Self::current_profile_or_fallback`]
    /// covers the gap.
    pub async fn register(&self, registration: Registration) -> GatewayResult<Profile> {
        const OPERATION: &str = "auth.register";
        if registration.email.trim().is_empty() || registration.password.is_empty() {
            return Err(GatewayError::rejected(
                OPERATION,
                Error::InvalidInput("Email and password are required".into()),
            ));
        }

        let auth = self.auth.as_ref();
        let registration = &registration;
        let user = self
            .run(OPERATION, move || async move { auth.sign_up(registration).await })
            .await?;

        let profile = Profile::new(user.id.clone(), registration.email.clone())
            .with_username(registration.username.clone())
            .with_name(registration.name.clone());
        let profiles = self.table(tables::PROFILES);
        let profile = &profile;
        let stored = self
            .run("profiles.insert", move || async move {
                profiles.insert_one(profile).await
            })
            .await?;
        info!(user_id = %stored.id, "Registered account");
        Ok(stored)
    }

    pub async fn sign_out(&self) -> GatewayResult<()> {
        let auth = self.auth.as_ref();
        self.run("auth.sign_out", move || async move { auth.sign_out().await })
            .await
    }

    /// The signed-in account, read from the local session
    pub async fn current_user(&self) -> Option<AuthUser> {
        self.auth.current_user().await
    }

    /// Profile row of the signed-in account; `None` when signed out or missing
    pub async fn current_profile(&self) -> GatewayResult<Option<Profile>> {
        let Some(user) = self.auth.current_user().await else {
            return Ok(None);
        };
        let profiles = self.table(tables::PROFILES);
        let query = Query::new().eq("id", user.id);
        let query = &query;
        self.run("profiles.current", move || async move {
            profiles.select_optional(query).await
        })
        .await
    }

    /// Profile of the signed-in account, built from session data when the row
    /// cannot be read
    pub async fn current_profile_or_fallback(&self) -> Option<Profile> {
        let user = self.auth.current_user().await?;
        match self.current_profile().await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                warn!(user_id = %user.id, "No profile row, using session data");
                Some(Profile::fallback(&user))
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Profile unavailable, using session data");
                Some(Profile::fallback(&user))
            }
        }
    }

    pub async fn all_profiles(&self) -> GatewayResult<Vec<Profile>> {
        let profiles = self.table(tables::PROFILES);
        let query = Query::new();
        let query = &query;
        self.run("profiles.all", move || async move { profiles.select(query).await })
            .await
    }

    /// Every profile except the signed-in user's
    pub async fn other_profiles(&self) -> GatewayResult<Vec<Profile>> {
        let me = self.auth.current_user().await.map(|user| user.id);
        let profiles = self.all_profiles().await?;
        Ok(profiles
            .into_iter()
            .filter(|profile| me.as_deref() != Some(profile.id.as_str()))
            .collect())
    }

    pub async fn profile_by_id(&self, user_id: &str) -> GatewayResult<Profile> {
        let profiles = self.table(tables::PROFILES);
        let query = Query::new().eq("id", user_id);
        let query = &query;
        self.run("profiles.get", move || async move {
            profiles.select_single(query).await
        })
        .await
    }

    /// Change the signed-in user's display name and username
    pub async fn update_profile(&self, name: &str, username: &str) -> GatewayResult<()> {
        const OPERATION: &str = "profiles.update";
        if username.trim().is_empty() {
            return Err(GatewayError::rejected(
                OPERATION,
                Error::InvalidInput("Username cannot be blank".into()),
            ));
        }
        let user = self.require_user(OPERATION).await?;

        let profiles = self.table(tables::PROFILES);
        let query = Query::new().eq("id", user.id);
        let patch = json!({
            "name": name.trim(),
            "username": username.trim(),
            "updated_at": Utc::now().to_rfc3339(),
        });
        let (query, patch) = (&query, &patch);
        self.run(OPERATION, move || async move {
            profiles.patch(query, patch.clone()).await
        })
        .await
    }

    /// Store a picture in the upload bucket and return its public URL.
    ///
    /// The object name is chosen once, so every attempt writes the same path.
    pub async fn upload_image(&self, bytes: &[u8], content_type: &str) -> GatewayResult<String> {
        const OPERATION: &str = "storage.upload";
        let Some(extension) = image_extension(content_type) else {
            return Err(GatewayError::rejected(
                OPERATION,
                Error::InvalidInput(format!("Not an image content type: {}", content_type)),
            ));
        };
        if bytes.is_empty() {
            return Err(GatewayError::rejected(
                OPERATION,
                Error::InvalidInput("Image is empty".into()),
            ));
        }

        let path = format!("{}.{}", Uuid::new_v4(), extension);
        let backend = self.backend.as_ref();
        let (bucket, object) = (self.bucket.as_str(), path.as_str());
        self.run(OPERATION, move || async move {
            backend.upload(bucket, object, bytes, content_type).await
        })
        .await?;

        let url = backend.public_url(bucket, object);
        info!(path = %path, size = bytes.len(), "Image uploaded");
        Ok(url)
    }

    /// Upload a new avatar for the signed-in user and return its URL
    pub async fn upload_avatar(&self, bytes: &[u8], content_type: &str) -> GatewayResult<String> {
        let user = self.require_user("profiles.avatar").await?;
        let url = self.upload_image(bytes, content_type).await?;

        let profiles = self.table(tables::PROFILES);
        let query = Query::new().eq("id", user.id);
        let patch = json!({
            "avatar_url": url,
            "updated_at": Utc::now().to_rfc3339(),
        });
        let (query, patch) = (&query, &patch);
        self.run("profiles.avatar", move || async move {
            profiles.patch(query, patch.clone()).await
        })
        .await?;
        Ok(url)
    }
}

/// File extension for an `image/*` content type
fn image_extension(content_type: &str) -> Option<&str> {
    let subtype = content_type
        .split(';')
        .next()?
        .trim()
        .strip_prefix("image/")?;
    match subtype {
        "" => None,
        "jpeg" => Some("jpg"),
        "svg+xml" => Some("svg"),
        other => Some(other),
    }
}
