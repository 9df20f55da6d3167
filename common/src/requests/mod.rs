use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
/// Body of `POST /casillero/bloque`.
/// `mode = true` numbers lockers across rows, `false` down columns.
pub struct CreateBlockRequest {
    #[serde(default)]
    pub mode: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListLockersQuery {
    #[serde(default)]
    pub letra: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ClearLockerRequest {
    #[serde(default)]
    pub registrado_por: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClearBlockRequest {
    pub letra: String,
    #[serde(default)]
    pub registrado_por: Option<String>,
}

#[derive(Debug, Deserialize)]
/// Credentials for `POST /auth/login`; `user` is a username or an email.
pub struct LoginRequest {
    pub user: String,
    pub password: String,
}
