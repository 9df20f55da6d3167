use crate::error::ApiError;

pub const COST: u32 = 10;

const SPECIALS: &str = "@$!%*?&";

pub fn hash(plain: &str) -> Result<String, ApiError> {
    Ok(bcrypt::hash(plain, COST)?)
}

pub fn verify(plain: &str, hash: &str) -> Result<bool, ApiError> {
    Ok(bcrypt::verify(plain, hash)?)
}

/// At least 8 characters with a lowercase letter, an uppercase letter, a digit
/// and one of `@$!%*?&`.
pub fn check_policy(plain: &str) -> Result<(), ApiError> {
    let long_enough = plain.chars().count() >= 8;
    let lower = plain.chars().any(|c| c.is_ascii_lowercase());
    let upper = plain.chars().any(|c| c.is_ascii_uppercase());
    let digit = plain.chars().any(|c| c.is_ascii_digit());
    let special = plain.chars().any(|c| SPECIALS.contains(c));

    if long_enough && lower && upper && digit && special {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "La contraseña debe tener al menos 8 caracteres, una minúscula, una mayúscula, un número y un carácter especial ({})",
            SPECIALS
        )))
    }
}
