// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Static user directory

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AppConfig, Credential};

/// A logged-in user; never carries the password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

/// Fixed set of credentials checked by exact match
#[derive(Debug, Clone)]
pub struct UserDirectory {
    credentials: Vec<Credential>,
}

impl UserDirectory {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.users.clone())
    }

    pub fn login(&self, username: &str, password: &str) -> Option<User> {
        let found = self
            .credentials
            .iter()
            .find(|c| c.username == username && c.password == password)
            .map(|c| User {
                username: c.username.clone(),
            });
        if found.is_none() {
            debug!("Rejected login for {:?}", username);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_admin_login() {
        let users = UserDirectory::from_config(&AppConfig::default());

        assert_eq!(
            users.login("admin", "12345678"),
            Some(User { username: "admin".to_string() })
        );
        assert_eq!(users.login("admin", "123456789"), None);
        assert_eq!(users.login("Admin", "12345678"), None);
        assert_eq!(users.login("", ""), None);
    }

    #[test]
    fn test_multiple_credentials() {
        let users = UserDirectory::new(vec![
            Credential { username: "a".to_string(), password: "1".to_string() },
            Credential { username: "b".to_string(), password: "2".to_string() },
        ]);
        assert!(users.login("b", "2").is_some());
        assert!(users.login("a", "2").is_none());
    }
}
