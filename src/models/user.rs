use serde::{Deserialize, Serialize};

/// A user record held by the credential store.
///
/// The password is an opaque credential compared by equality; it is never
/// serialized back out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    #[serde(rename = "firstname", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastname", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

/// Body of create and update requests.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, rename = "firstname")]
    pub first_name: Option<String>,
    #[serde(default, rename = "lastname")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
}

impl UserInput {
    pub(crate) fn into_user(self, id: String) -> User {
        User {
            id,
            name: self.name,
            password: self.password,
            role: self.role,
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
        }
    }
}
