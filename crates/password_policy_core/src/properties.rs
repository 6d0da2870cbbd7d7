//! Coercion of string-typed custom resource properties into a typed policy.
//!
//! CloudFormation serializes every custom resource property as a string, so
//! booleans arrive as `"true"`/`"false"` and integers as decimal text.

use serde::Serialize;
use serde_json::Value;

use crate::contract::{ProvisioningEvent, ResourceProperties, ValidationError};

pub const MINIMUM_PASSWORD_LENGTH: &str = "MinimumPasswordLength";
pub const REQUIRE_SYMBOLS: &str = "RequireSymbols";
pub const REQUIRE_NUMBERS: &str = "RequireNumbers";
pub const REQUIRE_UPPERCASE_CHARACTERS: &str = "RequireUppercaseCharacters";
pub const REQUIRE_LOWERCASE_CHARACTERS: &str = "RequireLowercaseCharacters";
pub const ALLOW_USERS_TO_CHANGE_PASSWORD: &str = "AllowUsersToChangePassword";
pub const MAX_PASSWORD_AGE: &str = "MaxPasswordAge";
pub const PASSWORD_REUSE_PREVENTION: &str = "PasswordReusePrevention";
pub const HARD_EXPIRY: &str = "HardExpiry";

pub const BOOLEAN_PROPERTIES: [&str; 6] = [
    REQUIRE_SYMBOLS,
    REQUIRE_NUMBERS,
    REQUIRE_UPPERCASE_CHARACTERS,
    REQUIRE_LOWERCASE_CHARACTERS,
    ALLOW_USERS_TO_CHANGE_PASSWORD,
    HARD_EXPIRY,
];

pub const INTEGER_PROPERTIES: [&str; 3] = [
    MINIMUM_PASSWORD_LENGTH,
    MAX_PASSWORD_AGE,
    PASSWORD_REUSE_PREVENTION,
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PasswordPolicySpec {
    pub minimum_password_length: i32,
    pub require_symbols: bool,
    pub require_numbers: bool,
    pub require_uppercase_characters: bool,
    pub require_lowercase_characters: bool,
    pub allow_users_to_change_password: bool,
    pub max_password_age: i32,
    pub password_reuse_prevention: i32,
    pub hard_expiry: bool,
}

impl PasswordPolicySpec {
    /// Writes the typed values back under their wire property names.
    pub fn write_into(&self, properties: &mut ResourceProperties) {
        let typed = [
            (MINIMUM_PASSWORD_LENGTH, Value::from(self.minimum_password_length)),
            (REQUIRE_SYMBOLS, Value::Bool(self.require_symbols)),
            (REQUIRE_NUMBERS, Value::Bool(self.require_numbers)),
            (
                REQUIRE_UPPERCASE_CHARACTERS,
                Value::Bool(self.require_uppercase_characters),
            ),
            (
                REQUIRE_LOWERCASE_CHARACTERS,
                Value::Bool(self.require_lowercase_characters),
            ),
            (
                ALLOW_USERS_TO_CHANGE_PASSWORD,
                Value::Bool(self.allow_users_to_change_password),
            ),
            (MAX_PASSWORD_AGE, Value::from(self.max_password_age)),
            (
                PASSWORD_REUSE_PREVENTION,
                Value::from(self.password_reuse_prevention),
            ),
            (HARD_EXPIRY, Value::Bool(self.hard_expiry)),
        ];

        for (key, value) in typed {
            properties.insert(key.to_string(), value);
        }
    }
}

pub fn normalize_properties(
    properties: &ResourceProperties,
) -> Result<PasswordPolicySpec, ValidationError> {
    let require_symbols = boolean_property(properties, REQUIRE_SYMBOLS)?;
    let require_numbers = boolean_property(properties, REQUIRE_NUMBERS)?;
    let require_uppercase_characters = boolean_property(properties, REQUIRE_UPPERCASE_CHARACTERS)?;
    let require_lowercase_characters = boolean_property(properties, REQUIRE_LOWERCASE_CHARACTERS)?;
    let allow_users_to_change_password =
        boolean_property(properties, ALLOW_USERS_TO_CHANGE_PASSWORD)?;
    let hard_expiry = boolean_property(properties, HARD_EXPIRY)?;

    Ok(PasswordPolicySpec {
        minimum_password_length: integer_property(properties, MINIMUM_PASSWORD_LENGTH)?,
        require_symbols,
        require_numbers,
        require_uppercase_characters,
        require_lowercase_characters,
        allow_users_to_change_password,
        max_password_age: integer_property(properties, MAX_PASSWORD_AGE)?,
        password_reuse_prevention: integer_property(properties, PASSWORD_REUSE_PREVENTION)?,
        hard_expiry,
    })
}

/// Normalizes the event's properties and overwrites them in place with typed
/// values. On error the properties are left as received.
pub fn normalize_event(
    event: &mut ProvisioningEvent,
) -> Result<PasswordPolicySpec, ValidationError> {
    let policy = normalize_properties(&event.resource_properties)?;
    policy.write_into(&mut event.resource_properties);
    Ok(policy)
}

fn required<'a>(
    properties: &'a ResourceProperties,
    key: &str,
) -> Result<&'a Value, ValidationError> {
    properties
        .get(key)
        .ok_or_else(|| ValidationError::MissingProperty {
            property: key.to_string(),
        })
}

fn boolean_property(properties: &ResourceProperties, key: &str) -> Result<bool, ValidationError> {
    match required(properties, key)? {
        Value::String(text) if text == "true" => Ok(true),
        Value::String(text) if text == "false" => Ok(false),
        other => Err(ValidationError::UnsupportedBoolean {
            property: key.to_string(),
            value: raw_text(other),
        }),
    }
}

fn integer_property(properties: &ResourceProperties, key: &str) -> Result<i32, ValidationError> {
    let invalid = |value: &Value, reason: String| ValidationError::InvalidInteger {
        property: key.to_string(),
        value: raw_text(value),
        reason,
    };

    let value = required(properties, key)?;
    match value {
        Value::String(text) => text
            .trim()
            .parse::<i32>()
            .map_err(|error| invalid(value, error.to_string())),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| whole_number(number.as_f64()?))
            .and_then(|parsed| i32::try_from(parsed).ok())
            .ok_or_else(|| invalid(value, "not a 32-bit integer".to_string())),
        _ => Err(invalid(value, "expected a numeric string".to_string())),
    }
}

// Direct invocations may send `14.0`; fractional values stay invalid.
fn whole_number(number: f64) -> Option<i64> {
    (number.is_finite() && number.fract() == 0.0).then_some(number as i64)
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
