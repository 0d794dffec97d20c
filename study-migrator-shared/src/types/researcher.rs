use serde::{Deserialize, Serialize};

use super::entity::{EntityKind, PrimaryKey, Record, UniqueKey};
use crate::validation::{Validate, ValidationError, max_length, required_text};

pub const USERNAME_MAX_LENGTH: usize = 32;
pub const PASSWORD_MAX_LENGTH: usize = 44;
pub const SALT_MAX_LENGTH: usize = 24;
pub const ACCESS_KEY_ID_MAX_LENGTH: usize = 64;

/// An admin account as stored in the legacy document store, keyed by username.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceAdmin {
    #[serde(rename = "_id")]
    pub username: String,
    #[serde(default)]
    pub system_admin: bool,
    pub password: String,
    pub salt: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub access_key_secret: Option<String>,
    #[serde(default)]
    pub access_key_secret_salt: Option<String>,
}

/// A researcher row ready to be inserted into the destination store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResearcher {
    pub username: String,
    pub admin: bool,
    pub password: String,
    pub salt: String,
    pub access_key_id: Option<String>,
    pub access_key_secret: String,
    pub access_key_secret_salt: String,
    pub deleted: bool,
}

impl From<&SourceAdmin> for NewResearcher {
    fn from(admin: &SourceAdmin) -> Self {
        // access_key_id is unique, so an empty one must become NULL
        let access_key_id = admin
            .access_key_id
            .clone()
            .filter(|id| !id.is_empty());

        Self {
            username: admin.username.clone(),
            admin: admin.system_admin,
            password: admin.password.clone(),
            salt: admin.salt.clone(),
            access_key_id,
            access_key_secret: admin.access_key_secret.clone().unwrap_or_default(),
            access_key_secret_salt: admin.access_key_secret_salt.clone().unwrap_or_default(),
            deleted: false,
        }
    }
}

impl Validate for NewResearcher {
    fn validate(&self) -> Result<(), ValidationError> {
        required_text("username", &self.username, USERNAME_MAX_LENGTH)?;
        required_text("password", &self.password, PASSWORD_MAX_LENGTH)?;
        required_text("salt", &self.salt, SALT_MAX_LENGTH)?;
        if let Some(access_key_id) = &self.access_key_id {
            max_length("access_key_id", access_key_id, ACCESS_KEY_ID_MAX_LENGTH)?;
        }
        max_length("access_key_secret", &self.access_key_secret, PASSWORD_MAX_LENGTH)?;
        max_length(
            "access_key_secret_salt",
            &self.access_key_secret_salt,
            SALT_MAX_LENGTH,
        )
    }
}

impl Record for NewResearcher {
    const KIND: EntityKind = EntityKind::Researcher;

    fn label(&self) -> String {
        self.username.clone()
    }

    fn unique_keys(&self) -> Vec<UniqueKey<'_>> {
        let mut keys = vec![UniqueKey::ResearcherUsername(&self.username)];
        if let Some(access_key_id) = &self.access_key_id {
            keys.push(UniqueKey::ResearcherAccessKeyId(access_key_id));
        }
        keys
    }
}

/// A row of the study ⇄ researcher many-to-many relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StudyResearcher {
    pub study_id: PrimaryKey,
    pub researcher_id: PrimaryKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_admin() -> SourceAdmin {
        SourceAdmin {
            username: "bob".to_string(),
            system_admin: true,
            password: "hash".to_string(),
            salt: "salt".to_string(),
            access_key_id: Some(String::new()),
            access_key_secret: None,
            access_key_secret_salt: None,
        }
    }

    #[test]
    fn test_empty_access_key_becomes_null() {
        let researcher = NewResearcher::from(&source_admin());
        assert_eq!(researcher.access_key_id, None);
        assert_eq!(researcher.access_key_secret, "");
        assert_eq!(researcher.access_key_secret_salt, "");
        assert!(researcher.admin);
        assert!(!researcher.deleted);
        assert_eq!(
            researcher.unique_keys(),
            vec![UniqueKey::ResearcherUsername("bob")]
        );
    }

    #[test]
    fn test_access_key_is_unique_when_present() {
        let admin = SourceAdmin {
            access_key_id: Some("AKID".to_string()),
            ..source_admin()
        };
        let researcher = NewResearcher::from(&admin);
        assert_eq!(
            researcher.unique_keys(),
            vec![
                UniqueKey::ResearcherUsername("bob"),
                UniqueKey::ResearcherAccessKeyId("AKID")
            ]
        );
    }

    #[test]
    fn test_long_username_is_rejected() {
        let admin = SourceAdmin {
            username: "x".repeat(33),
            ..source_admin()
        };
        assert!(matches!(
            NewResearcher::from(&admin).validate(),
            Err(ValidationError::TooLong { field: "username", .. })
        ));
    }
}
