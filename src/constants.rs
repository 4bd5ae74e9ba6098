// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:8080";
pub const DATABASE_FILE: &str = "billing.db";

// Token configuration
pub const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 8;
pub const MIN_JWT_SECRET_LENGTH: usize = 32;
pub const BEARER_PREFIX: &str = "Bearer ";

// Pagination defaults
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 25;
pub const MAX_PER_PAGE: u32 = 100;

// Validation limits
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_ADDRESS_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 100;
pub const MAX_SEARCH_TERM_LENGTH: usize = 100;
pub const MIN_PASSWORD_LENGTH: usize = 5;
pub const CPF_LENGTH: usize = 11;
pub const ZIP_CODE_LENGTH: usize = 8;
pub const PHONE_COUNTRY_PREFIX: &str = "+55";
pub const PHONE_NATIONAL_LENGTH: usize = 11;

// Error messages
pub const ERR_INTERNAL: &str = "Internal server error.";
pub const ERR_UNAUTHORIZED: &str = "Unauthorized!";
pub const ERR_EMAIL_TAKEN: &str = "E-mail already registered.";
pub const ERR_CPF_TAKEN: &str = "CPF already registered.";
pub const ERR_CLIENT_NOT_FOUND: &str = "Client not found.";
pub const ERR_RECORD_NOT_FOUND: &str = "Record not found.";
pub const ERR_INVALID_ID: &str = "Invalid id.";
pub const ERR_NO_CLIENTS: &str = "No clients found.";
pub const ERR_NO_RECORDS: &str = "No records found.";
pub const ERR_INVALID_CREDENTIALS: &str = "Invalid e-mail or password.";
pub const ERR_INVALID_PASSWORD: &str = "Invalid password.";
