use std::fmt::Display;

use time::Date;

use crate::constants::*;
use crate::error::AppError;

pub fn db_error_with_context(context: &str, err: impl Display) -> AppError {
    AppError::internal(format!("{}: {}", context, err))
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(
            field_name,
            format!("{} cannot be empty", field_name),
        ));
    }
    if value.chars().count() > max_length {
        return Err(AppError::validation(
            field_name,
            format!("{} must be less than {} characters", field_name, max_length),
        ));
    }
    Ok(())
}

pub fn validate_optional_string(
    value: Option<&str>,
    field_name: &str,
    max_length: usize,
) -> Result<(), AppError> {
    match value {
        Some(v) => validate_string_length(v, field_name, max_length),
        None => Ok(()),
    }
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    validate_string_length(email, "email", MAX_EMAIL_LENGTH)?;

    let invalid = || AppError::validation("email", "E-mail must be valid.");
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && tld.len() >= 2 => Ok(()),
        _ => Err(invalid()),
    }
}

/// Brazilian taxpayer id: 11 digits whose last two are check digits.
pub fn is_valid_cpf(cpf: &str) -> bool {
    if cpf.len() != CPF_LENGTH || !cpf.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u32> = cpf.bytes().map(|b| u32::from(b - b'0')).collect();
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check_digit = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 { 0 } else { rest }
    };

    check_digit(9) == digits[9] && check_digit(10) == digits[10]
}

pub fn validate_cpf(cpf: &str) -> Result<(), AppError> {
    if !is_valid_cpf(cpf.trim()) {
        return Err(AppError::validation("cpf", "Invalid CPF."));
    }
    Ok(())
}

/// `+55` followed by area code and number, 11 digits in total.
pub fn validate_phone(phone: &str) -> Result<(), AppError> {
    let national = phone.trim().strip_prefix(PHONE_COUNTRY_PREFIX);
    match national {
        Some(n) if n.len() == PHONE_NATIONAL_LENGTH && n.bytes().all(|b| b.is_ascii_digit()) => {
            Ok(())
        }
        _ => Err(AppError::validation("phone", "Invalid phone number.")),
    }
}

pub fn validate_zip_code(zip_code: &str) -> Result<(), AppError> {
    let zip_code = zip_code.trim();
    if zip_code.len() != ZIP_CODE_LENGTH || !zip_code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::validation(
            "zip_code",
            "Zip code must be exactly 8 digits.",
        ));
    }
    Ok(())
}

pub fn validate_uf(uf: &str) -> Result<(), AppError> {
    let uf = uf.trim();
    if uf.len() != 2 || !uf.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(AppError::validation(
            "uf",
            "State must be two uppercase letters.",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str, field_name: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::validation(
            field_name,
            format!(
                "Password must contain at least {} characters.",
                MIN_PASSWORD_LENGTH
            ),
        ));
    }
    Ok(())
}

pub fn validate_password_confirmation(
    password: &str,
    confirmation: &str,
    field_name: &str,
) -> Result<(), AppError> {
    if password != confirmation {
        return Err(AppError::validation(field_name, "Passwords do not match."));
    }
    Ok(())
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<Date, AppError> {
    let invalid = || AppError::validation("due_date", "Invalid date.");
    if value.trim().is_empty() {
        return Err(invalid());
    }

    let format = time::format_description::parse("[year]-[month]-[day]")
        .map_err(|_| AppError::internal("invalid date format description"))?;

    Date::parse(value.trim(), &format).map_err(|_| invalid())
}

pub fn validate_value(value: f64) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::validation(
            "value",
            "Value must be a valid finite number.",
        ));
    }
    if value <= 0.0 {
        return Err(AppError::validation("value", "Value must be positive."));
    }
    Ok(())
}

pub fn validate_page(page: Option<u32>) -> Result<u32, AppError> {
    match page {
        Some(0) => Err(AppError::validation(
            "page",
            "Page must be greater than 0",
        )),
        Some(p) => Ok(p),
        None => Ok(DEFAULT_PAGE),
    }
}

pub fn validate_per_page(per_page: Option<u32>) -> Result<u32, AppError> {
    match per_page {
        Some(0) => Err(AppError::validation(
            "perPage",
            "perPage must be greater than 0",
        )),
        Some(p) if p > MAX_PER_PAGE => Err(AppError::validation(
            "perPage",
            format!("perPage cannot exceed {}", MAX_PER_PAGE),
        )),
        Some(p) => Ok(p),
        None => Ok(DEFAULT_PER_PAGE),
    }
}

/// Trims the optional search term, treating blank as absent.
pub fn normalize_search(name: Option<&str>) -> Result<Option<&str>, AppError> {
    let term = name.map(str::trim).filter(|s| !s.is_empty());
    if let Some(term) = term {
        validate_string_length(term, "name", MAX_SEARCH_TERM_LENGTH)?;
    }
    Ok(term)
}

/// Trims an optional text field, treating blank as absent.
pub fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Rounds a currency amount to cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_check_digits() {
        assert!(is_valid_cpf("52998224725"));
        assert!(is_valid_cpf("11144477735"));
        assert!(!is_valid_cpf("52998224724"));
        assert!(!is_valid_cpf("11111111111"));
        assert!(!is_valid_cpf("5299822472"));
        assert!(!is_valid_cpf("529.982.247-25"));
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("maria@example.com").is_ok());
        assert!(validate_email("maria@example").is_err());
        assert!(validate_email("maria example@x.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn phone_requires_country_prefix() {
        assert!(validate_phone("+5511987654321").is_ok());
        assert!(validate_phone("11987654321").is_err());
        assert!(validate_phone("+551198765432").is_err());
    }

    #[test]
    fn address_fields() {
        assert!(validate_zip_code("01310100").is_ok());
        assert!(validate_zip_code("01310-100").is_err());
        assert!(validate_uf("SP").is_ok());
        assert!(validate_uf("sp").is_err());
        assert!(validate_uf("SPA").is_err());
    }

    #[test]
    fn dates_are_iso() {
        let date = parse_date("2024-02-29").unwrap();
        assert_eq!(date.to_string(), "2024-02-29");
        assert!(parse_date("29-02-2024").is_err());
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn values_must_be_positive_and_finite() {
        assert!(validate_value(10.5).is_ok());
        assert!(validate_value(0.0).is_err());
        assert!(validate_value(-3.0).is_err());
        assert!(validate_value(f64::NAN).is_err());
    }

    #[test]
    fn pagination_defaults_and_bounds() {
        assert_eq!(validate_page(None).unwrap(), DEFAULT_PAGE);
        assert!(validate_page(Some(0)).is_err());
        assert_eq!(validate_per_page(None).unwrap(), DEFAULT_PER_PAGE);
        assert!(validate_per_page(Some(MAX_PER_PAGE + 1)).is_err());
        assert_eq!(validate_per_page(Some(10)).unwrap(), 10);
    }

    #[test]
    fn search_terms_are_trimmed() {
        assert_eq!(normalize_search(Some("  ana ")).unwrap(), Some("ana"));
        assert_eq!(normalize_search(Some("   ")).unwrap(), None);
        assert_eq!(normalize_search(None).unwrap(), None);
    }

    #[test]
    fn cents_rounding() {
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
        assert_eq!(round_cents(12.344), 12.34);
    }
}
