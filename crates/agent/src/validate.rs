//! Card field validators. Each one runs on every edit of its field.

use thiserror::Error;

const CCN_MAX_LEN: usize = 16 + 3;
const CCN_GROUP: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Номер карты слишком длинный")]
    CardNumberTooLong,
    #[error("Неверный номер карты")]
    CardNumberInvalid,
    #[error("Номер карты должен быть разделен пробелами")]
    CardNumberUngrouped,
    #[error("Неверный срок действия")]
    Expiry,
    #[error("Неверный cvv")]
    Cvv,
}

pub type Validator = fn(&str) -> Result<(), ValidationError>;

fn is_integer(s: &str) -> bool {
    s.parse::<i64>().is_ok()
}

/// Card number typed in groups of four digits, separated by single spaces.
/// A trailing separator does not count towards the length ceiling.
pub fn ccn(s: &str) -> Result<(), ValidationError> {
    let significant = s.strip_suffix(' ').unwrap_or(s);
    if significant.len() > CCN_MAX_LEN {
        return Err(ValidationError::CardNumberTooLong);
    }

    let Some(last) = s.bytes().last() else {
        return Err(ValidationError::CardNumberInvalid);
    };
    if s.len() % CCN_GROUP != 0 && !last.is_ascii_digit() {
        return Err(ValidationError::CardNumberInvalid);
    }
    if s.len() % CCN_GROUP == 0 && last != b' ' {
        return Err(ValidationError::CardNumberUngrouped);
    }

    if !is_integer(&s.replace(' ', "")) {
        return Err(ValidationError::CardNumberInvalid);
    }
    Ok(())
}

/// Expiry as `MM/YY`.
pub fn exp(s: &str) -> Result<(), ValidationError> {
    if !is_integer(&s.replace('/', "")) {
        return Err(ValidationError::Expiry);
    }
    if s.len() >= 3 && (s.find('/') != Some(2) || s.rfind('/') != Some(2)) {
        return Err(ValidationError::Expiry);
    }
    Ok(())
}

pub fn cvv(s: &str) -> Result<(), ValidationError> {
    if is_integer(s) {
        Ok(())
    } else {
        Err(ValidationError::Cvv)
    }
}
