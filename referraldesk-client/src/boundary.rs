//! Adapters for platform collaborators: image pickers, permission prompts
//! and callback-style APIs. Each is wrapped once here so the core only ever
//! awaits a `Result`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::multipart::Part;
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::{ApiError, BoundaryError};

/// Platform permissions the client may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    PhotoLibrary,
    Storage,
}

impl Permission {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::PhotoLibrary => "Photo library",
            Self::Storage => "Storage",
        }
    }
}

/// Asks the platform for a permission; resolves to whether it was granted.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn request(&self, permission: Permission) -> bool;
}

/// Grants everything. Suitable where the host has no permission model (CLI).
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantAll;

#[async_trait]
impl PermissionGate for GrantAll {
    async fn request(&self, _permission: Permission) -> bool {
        true
    }
}

/// Requests `permission` once; denial aborts the calling action.
///
/// # Errors
/// Returns [`BoundaryError::PermissionDenied`] when the user declines.
pub async fn require_permission(
    gate: &dyn PermissionGate,
    permission: Permission,
) -> Result<(), BoundaryError> {
    if gate.request(permission).await {
        Ok(())
    } else {
        warn!(permission = permission.label(), "permission denied");
        Err(BoundaryError::PermissionDenied(permission))
    }
}

/// File picked by the user, ready for multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Loads an attachment from disk, guessing its type from the extension.
    ///
    /// # Errors
    /// Returns [`BoundaryError::Io`] if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, BoundaryError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| BoundaryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        Ok(Self {
            mime_type: guess_mime(path).to_string(),
            file_name,
            bytes,
        })
    }

    /// Converts the attachment into a multipart part.
    ///
    /// # Errors
    /// Returns [`ApiError::Request`] if the MIME type is malformed.
    pub fn into_part(self) -> Result<Part, ApiError> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime_type)
            .map_err(|err| ApiError::Request(err.to_string()))
    }
}

fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Produces an attachment chosen by the user (image picker, file dialog).
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    /// # Errors
    /// [`BoundaryError::Cancelled`] when the user backs out of the picker.
    async fn pick(&self) -> Result<Attachment, BoundaryError>;
}

/// Picks a fixed file from disk.
#[derive(Debug, Clone)]
pub struct FileAttachmentSource {
    path: PathBuf,
}

impl FileAttachmentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AttachmentSource for FileAttachmentSource {
    async fn pick(&self) -> Result<Attachment, BoundaryError> {
        Attachment::from_path(&self.path).await
    }
}

/// Bridges a callback-style API into an awaitable result.
///
/// `register` receives a one-shot completion callback to hand to the
/// legacy API. If that callback is dropped without being invoked, the
/// future resolves to [`BoundaryError::Cancelled`].
///
/// # Errors
/// Returns [`BoundaryError::Cancelled`] when the callback is never invoked.
pub async fn from_callback<T, F>(register: F) -> Result<T, BoundaryError>
where
    T: Send + 'static,
    F: FnOnce(Box<dyn FnOnce(T) + Send>),
{
    let (sender, receiver) = oneshot::channel();
    register(Box::new(move |value| {
        // The receiver is gone only if the awaiting caller was dropped.
        let _ = sender.send(value);
    }));
    receiver.await.map_err(|_| BoundaryError::Cancelled)
}
