use serde::{Deserialize, Serialize};

/// A staff account without its password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "usuario")]
    pub username: String,
    #[serde(rename = "rol")]
    pub privileged: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewUser {
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "contrasena")]
    pub password: String,
    #[serde(rename = "usuario")]
    pub username: String,
    #[serde(rename = "rol", default)]
    pub privileged: bool,
}

/// Partial account update. The password, when present, is plain text and is
/// hashed by the backend before it is stored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserUpdate {
    #[serde(rename = "nombre", default)]
    pub first_name: Option<String>,
    #[serde(rename = "apellido", default)]
    pub last_name: Option<String>,
    #[serde(rename = "correo", default)]
    pub email: Option<String>,
    #[serde(rename = "contrasena", default)]
    pub password: Option<String>,
    #[serde(rename = "usuario", default)]
    pub username: Option<String>,
    #[serde(rename = "rol", default)]
    pub privileged: Option<bool>,
}

impl UserUpdate {
    pub fn apply(&self, current: &UserProfile) -> UserProfile {
        UserProfile {
            id: current.id,
            first_name: self
                .first_name
                .clone()
                .unwrap_or_else(|| current.first_name.clone()),
            last_name: self
                .last_name
                .clone()
                .unwrap_or_else(|| current.last_name.clone()),
            email: self.email.clone().unwrap_or_else(|| current.email.clone()),
            username: self
                .username
                .clone()
                .unwrap_or_else(|| current.username.clone()),
            privileged: self.privileged.unwrap_or(current.privileged),
        }
    }
}
