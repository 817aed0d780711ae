//! In-memory credential store.

use dashmap::DashMap;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::{User, UserInput};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("user not found")]
    UserNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid user: {0}")]
    InvalidUser(String),
}

pub struct UserStore {
    users: DashMap<String, User>,
}

impl UserStore {
    /// Empty store.
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    /// Store pre-populated with the two embedded accounts.
    pub fn seeded() -> Self {
        let store = Self::new();
        for (id, name, role) in [("embedded1", "John", "admin"), ("embedded2", "Jane", "user")] {
            store.users.insert(
                id.to_string(),
                User {
                    id: id.to_string(),
                    name: name.to_string(),
                    password: "VMware1!".to_string(),
                    role: role.to_string(),
                    first_name: None,
                    last_name: None,
                    age: None,
                },
            );
        }
        store
    }

    pub fn create(&self, input: UserInput) -> Result<User, UserError> {
        validate(&input)?;
        let user = input.into_user(Uuid::new_v4().to_string());
        self.users.insert(user.id.clone(), user.clone());
        tracing::info!(user_id = %user.id, name = %user.name, "user created");
        Ok(user)
    }

    pub fn get(&self, id: &str) -> Result<User, UserError> {
        self.users
            .get(id)
            .map(|u| u.value().clone())
            .ok_or(UserError::UserNotFound)
    }

    /// All users, ordered by name then id.
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        users
    }

    /// Replace every mutable field of the user. The id is kept.
    pub fn update(&self, id: &str, input: UserInput) -> Result<User, UserError> {
        validate(&input)?;
        let mut entry = self.users.get_mut(id).ok_or(UserError::UserNotFound)?;
        *entry = input.into_user(id.to_string());
        tracing::info!(user_id = %id, "user updated");
        Ok(entry.value().clone())
    }

    pub fn delete(&self, id: &str) -> Result<(), UserError> {
        self.users
            .remove(id)
            .map(|_| tracing::info!(user_id = %id, "user deleted"))
            .ok_or(UserError::UserNotFound)
    }

    /// Look up a user by name and check the password.
    pub fn validate_credentials(&self, name: &str, password: &str) -> Result<User, UserError> {
        self.users
            .iter()
            .find(|u| {
                u.name == name && bool::from(u.password.as_bytes().ct_eq(password.as_bytes()))
            })
            .map(|u| u.value().clone())
            .ok_or_else(|| {
                tracing::warn!(name = %name, "login rejected");
                UserError::InvalidCredentials
            })
    }
}

fn validate(input: &UserInput) -> Result<(), UserError> {
    if input.name.trim().is_empty() {
        return Err(UserError::InvalidUser("name must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, password: &str) -> UserInput {
        UserInput {
            name: name.into(),
            password: password.into(),
            role: "user".into(),
            first_name: None,
            last_name: None,
            age: None,
        }
    }

    #[test]
    fn test_seeded_users_can_log_in() {
        let store = UserStore::seeded();
        let john = store.validate_credentials("John", "VMware1!").unwrap();
        assert_eq!(john.id, "embedded1");
        assert_eq!(john.role, "admin");
    }

    #[test]
    fn test_wrong_password_rejected() {
        let store = UserStore::seeded();
        assert_eq!(
            store.validate_credentials("John", "nope"),
            Err(UserError::InvalidCredentials)
        );
        assert_eq!(
            store.validate_credentials("Nobody", "VMware1!"),
            Err(UserError::InvalidCredentials)
        );
    }

    #[test]
    fn test_create_get_update_delete() {
        let store = UserStore::new();
        let created = store.create(input("bob", "pw1")).unwrap();
        assert_eq!(store.get(&created.id).unwrap().name, "bob");

        let mut changed = input("robert", "pw2");
        changed.age = Some(41);
        let updated = store.update(&created.id, changed).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "robert");
        assert_eq!(updated.age, Some(41));
        assert!(store.validate_credentials("robert", "pw2").is_ok());

        store.delete(&created.id).unwrap();
        assert_eq!(store.get(&created.id), Err(UserError::UserNotFound));
        assert_eq!(store.delete(&created.id), Err(UserError::UserNotFound));
    }

    #[test]
    fn test_update_missing_user() {
        let store = UserStore::new();
        assert_eq!(
            store.update("missing", input("x", "y")),
            Err(UserError::UserNotFound)
        );
    }

    #[test]
    fn test_blank_name_rejected() {
        let store = UserStore::new();
        assert!(matches!(
            store.create(input("   ", "pw")),
            Err(UserError::InvalidUser(_))
        ));
    }

    #[test]
    fn test_list_sorted_by_name() {
        let store = UserStore::seeded();
        store.create(input("Adam", "pw")).unwrap();
        let names: Vec<String> = store.list().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Adam", "Jane", "John"]);
    }
}
