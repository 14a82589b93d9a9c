use serde::{Deserialize, Deserializer, Serialize};

use crate::validation::{Rule, Validate, ValidationError, Validator, AT_LEAST_ONE_FIELD};

const USERNAME_RULES: &[Rule] = &[Rule::Required, Rule::MinLength(3), Rule::MaxLength(32)];
const EMAIL_RULES: &[Rule] = &[Rule::Required, Rule::Email];
const PASSWORD_RULES: &[Rule] = &[Rule::Required, Rule::MinLength(8)];

/// Request body for `POST /users`. Missing and `null` fields deserialize as
/// empty and are reported by validation, not by the JSON parser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserInput {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub password: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Validate for CreateUserInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .field("Username", &self.username, USERNAME_RULES)
            .field("Email", &self.email, EMAIL_RULES)
            .field("Password", &self.password, PASSWORD_RULES)
            .finish()
    }
}

/// Request body for `PUT /users/:id`. An empty string counts as absent, so
/// `Required` in the shared rule sets never fires for present values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl UpdateUserInput {
    pub fn username(&self) -> Option<&str> {
        present(&self.username)
    }

    pub fn email(&self) -> Option<&str> {
        present(&self.email)
    }

    pub fn password(&self) -> Option<&str> {
        present(&self.password)
    }

    pub fn is_empty(&self) -> bool {
        self.username().is_none() && self.email().is_none() && self.password().is_none()
    }
}

impl Validate for UpdateUserInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .optional("Username", self.username(), USERNAME_RULES)
            .optional("Email", self.email(), EMAIL_RULES)
            .optional("Password", self.password(), PASSWORD_RULES)
            .require(!self.is_empty(), AT_LEAST_ONE_FIELD)
            .finish()
    }
}

/// Body of every non-entity response.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(username: &str, email: &str, password: &str) -> CreateUserInput {
        CreateUserInput {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn valid_create_passes() {
        assert!(create("alice", "alice@example.com", "longenough").validate().is_ok());
    }

    #[test]
    fn short_username_is_rejected() {
        let err = create("ab", "a@b.com", "longenough").validate().unwrap_err();
        assert_eq!(err.message(), "Field Username min length 3");
    }

    #[test]
    fn missing_fields_report_required() {
        let input: CreateUserInput = serde_json::from_str(r#"{"username":"alice","email":"a@b.com"}"#).unwrap();
        assert_eq!(input.validate().unwrap_err().message(), "Field Password is required");
    }

    #[test]
    fn null_fields_report_required() {
        let input: CreateUserInput =
            serde_json::from_str(r#"{"username":null,"email":"a@b.com","password":"longenough"}"#)
                .unwrap();
        assert_eq!(input.username, "");
        assert_eq!(input.validate().unwrap_err().message(), "Field Username is required");
    }

    #[test]
    fn invalid_email_on_create() {
        let err = create("alice", "not-an-email", "longenough").validate().unwrap_err();
        assert_eq!(err.message(), "Field Email must be a valid email");
    }

    #[test]
    fn only_last_violation_is_reported() {
        let err = create("ab", "bad", "short").validate().unwrap_err();
        assert_eq!(err.message(), "Field Password min length 8");
    }

    #[test]
    fn empty_update_is_rejected() {
        let input: UpdateUserInput = serde_json::from_str("{}").unwrap();
        assert_eq!(input.validate().unwrap_err().message(), "At least one field is required");
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let input: UpdateUserInput =
            serde_json::from_str(r#"{"username":"","email":"","password":""}"#).unwrap();
        assert!(input.is_empty());
        assert_eq!(input.validate().unwrap_err().message(), "At least one field is required");
    }

    #[test]
    fn partial_update_validates_present_fields() {
        let ok: UpdateUserInput = serde_json::from_str(r#"{"email":"new@example.com"}"#).unwrap();
        assert!(ok.validate().is_ok());

        let bad: UpdateUserInput = serde_json::from_str(r#"{"password":"short"}"#).unwrap();
        assert_eq!(bad.validate().unwrap_err().message(), "Field Password min length 8");
    }

    #[test]
    fn overlong_username_on_update() {
        let input = UpdateUserInput {
            username: Some("x".repeat(40)),
            ..Default::default()
        };
        assert_eq!(input.validate().unwrap_err().message(), "Field Username max length 32");
    }
}
