use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use tracing::debug;

use crate::{
    error::WizardError,
    record::FormRecord,
    schema::{FieldSpec, Schema},
};

/// Forms of the sign-in / sign-up flow whose values outlive a single page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthForm {
    SignIn,
    SignUp,
    ForgotPassword,
    ResetPassword,
    ChangePassword,
    SetPassword,
    CompleteSignup,
}

impl AuthForm {
    pub const ALL: [AuthForm; 7] = [
        AuthForm::SignIn,
        AuthForm::SignUp,
        AuthForm::ForgotPassword,
        AuthForm::ResetPassword,
        AuthForm::ChangePassword,
        AuthForm::SetPassword,
        AuthForm::CompleteSignup,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AuthForm::SignIn => "sign-in",
            AuthForm::SignUp => "sign-up",
            AuthForm::ForgotPassword => "forgot-password",
            AuthForm::ResetPassword => "reset-password",
            AuthForm::ChangePassword => "change-password",
            AuthForm::SetPassword => "set-password",
            AuthForm::CompleteSignup => "complete-signup",
        }
    }
}

impl fmt::Display for AuthForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthForm {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuthForm::ALL
            .into_iter()
            .find(|form| form.as_str() == s)
            .ok_or_else(|| WizardError::UnknownAuthForm(s.to_string()))
    }
}

/// Values typed into the authentication forms, one record per form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthFormStore {
    forms: BTreeMap<AuthForm, FormRecord>,
}

impl AuthFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, form: AuthForm) -> FormRecord {
        self.forms.get(&form).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, form: AuthForm, partial: FormRecord) {
        debug!(form = %form, fields = partial.len(), "merging auth form data");
        self.forms.entry(form).or_default().merge(partial);
    }

    pub fn reset(&mut self, form: AuthForm) {
        self.forms.remove(&form);
    }

    pub fn reset_all(&mut self) {
        self.forms.clear();
    }
}

fn email_field(name: &str) -> FieldSpec {
    FieldSpec::text(name).email("Please enter a valid email address")
}

fn strong_password(name: &str) -> FieldSpec {
    FieldSpec::text(name)
        .min(8, "Password must be at least 8 characters")
        .max(128, "Password must not exceed 128 characters")
        .matches("[A-Z]", "Password must contain at least one uppercase letter")
        .matches("[a-z]", "Password must contain at least one lowercase letter")
        .matches("[0-9]", "Password must contain at least one number")
        .matches(
            "[^A-Za-z0-9]",
            "Password must contain at least one special character (!@#$%^&*)",
        )
        .not_matches(r"\s", "Password must not contain spaces")
        .no_repeated_run(3, "Password must not contain repeated characters (e.g., aaa)")
}

fn security_answer(name: &str) -> FieldSpec {
    FieldSpec::text(name)
        .min(2, "Answer must be at least 2 characters")
        .max(100, "Answer must not exceed 100 characters")
}

pub fn sign_in_schema() -> Schema {
    Schema::new()
        .field(email_field("userId"))
        .field(FieldSpec::text("password").min(1, "Password is required"))
}

pub fn sign_up_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::text("firstName").min(1, "First name is required"))
        .field(FieldSpec::text("lastName").min(1, "Last name is required"))
        .field(email_field("email"))
        .field(FieldSpec::text("personalId").min(1, "Personal ID is required"))
        .field(
            FieldSpec::text("mobileNumber")
                .optional()
                .matches(r"^\+?\d{10,15}$", "Please enter a valid mobile number"),
        )
}

fn passwords_match(password_field: &'static str) -> impl Fn(&FormRecord) -> bool + Send + Sync {
    move |r: &FormRecord| r.get_str(password_field) == r.get_str("confirmPassword")
}

pub fn forgot_password_schema() -> Schema {
    Schema::new().field(email_field("email"))
}

/// New password chosen through an emailed reset link
pub fn reset_password_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::text("token").min(1, "Reset token is required"))
        .field(strong_password("password"))
        .field(FieldSpec::text("confirmPassword").min(1, "Please confirm your password"))
        .refine("confirmPassword", "Passwords do not match", passwords_match("password"))
}

pub fn change_password_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::text("currentPassword").min(1, "Current password is required"))
        .field(strong_password("newPassword"))
        .field(FieldSpec::text("confirmPassword").min(1, "Please confirm your new password"))
        .refine("confirmPassword", "Passwords do not match", passwords_match("newPassword"))
}

pub fn set_password_schema() -> Schema {
    Schema::new()
        .field(strong_password("password"))
        .field(FieldSpec::text("confirmPassword").min(1, "Please confirm your password"))
        .field(security_answer("securityQuestion1"))
        .field(security_answer("securityQuestion2"))
        .refine("confirmPassword", "Passwords do not match", passwords_match("password"))
        .refine(
            "securityQuestion2",
            "Security question answers must be different",
            |r| {
                let first = r.get_str("securityQuestion1").unwrap_or_default();
                let second = r.get_str("securityQuestion2").unwrap_or_default();
                first.to_lowercase() != second.to_lowercase()
            },
        )
}

pub fn complete_signup_schema() -> Schema {
    Schema::new().field(
        FieldSpec::text("otp")
            .min(1, "OTP is required")
            .length(6, "OTP must be exactly 6 digits")
            .matches(r"^\d{6}$", "OTP must contain only numbers"),
    )
}

pub fn auth_schema(form: AuthForm) -> Schema {
    match form {
        AuthForm::SignIn => sign_in_schema(),
        AuthForm::SignUp => sign_up_schema(),
        AuthForm::ForgotPassword => forgot_password_schema(),
        AuthForm::ResetPassword => reset_password_schema(),
        AuthForm::ChangePassword => change_password_schema(),
        AuthForm::SetPassword => set_password_schema(),
        AuthForm::CompleteSignup => complete_signup_schema(),
    }
}
