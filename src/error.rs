// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Pinakotheke

use thiserror::Error;

/// Result type alias for gallery operations
pub type Result<T> = std::result::Result<T, GalleryError>;

/// Gallery error types
///
/// Missing galleries and photos are not errors to the registries; lookups
/// return `Option`. Callers that need the gallery (CLI commands) turn a miss
/// into [`GalleryError::GalleryNotFound`].
#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Gallery not found: {0}")]
    GalleryNotFound(String),

    #[error("Gallery already exists: {0}")]
    GalleryExists(String),

    #[error("Tag inference unavailable: {0}")]
    InferenceUnavailable(String),

    #[error("Server error: {0}")]
    Server(String),
}
