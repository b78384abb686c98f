// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Pinakotheke: filesystem-backed photo galleries
//!
//! Galleries are directories named by the encoded gallery name, photos are
//! files inside them. Tags come from a local vision model on demand.

pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gallery;
pub mod photo;
pub mod store;
pub mod tagger;
pub mod user;
pub mod web;

pub use config::AppConfig;
pub use envelope::JsonResult;
pub use error::{GalleryError, Result};
pub use gallery::{Gallery, GalleryRegistry};
pub use photo::{Photo, PhotoRegistry};
pub use store::FsStore;
pub use user::{User, UserDirectory};
