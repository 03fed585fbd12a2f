use serde::{Serialize, Serializer};

/// Body of `POST /users`.
#[derive(Debug, Clone, Serialize)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Fields required by the API to change the account password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    pub old_password: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Body of `PUT /profile`.
///
/// The password fields are flattened into the body only when a password
/// change is requested; otherwise the server keeps the current password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub password_change: Option<PasswordChange>,
}

impl ProfileUpdate {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password_change: None,
        }
    }

    pub fn with_password_change(mut self, change: PasswordChange) -> Self {
        self.password_change = Some(change);
        self
    }
}

impl Serialize for ProfileUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let len = if self.password_change.is_some() { 5 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("email", &self.email)?;
        if let Some(ref change) = self.password_change {
            map.serialize_entry("old_password", &change.old_password)?;
            map.serialize_entry("password", &change.password)?;
            map.serialize_entry("password_confirmation", &change.password_confirmation)?;
        }
        map.end()
    }
}
