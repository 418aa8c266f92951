use lingo_core::model::FormError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignUpField {
    FullName,
    Email,
    Password,
    ConfirmPassword,
}

#[must_use]
pub fn field_of(error: FormError) -> SignUpField {
    match error {
        FormError::FullNameRequired => SignUpField::FullName,
        FormError::EmailRequired | FormError::EmailInvalid => SignUpField::Email,
        FormError::PasswordRequired | FormError::PasswordTooShort => SignUpField::Password,
        FormError::ConfirmationRequired | FormError::PasswordMismatch => {
            SignUpField::ConfirmPassword
        }
        _ => SignUpField::FullName,
    }
}

/// First message for `field`, if the field has a problem.
#[must_use]
pub fn field_error(errors: &[FormError], field: SignUpField) -> Option<String> {
    errors
        .iter()
        .find(|error| field_of(**error) == field)
        .map(ToString::to_string)
}
