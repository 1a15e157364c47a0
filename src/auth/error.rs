use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity provider rejected the request: {code}")]
    Provider { code: String },
    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected identity provider response: {0}")]
    Malformed(String),
}

/// Which entry form an error is reported on; decides the generic fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Login,
    SignUp,
}

impl Flow {
    pub fn generic_message(self) -> &'static str {
        match self {
            Flow::Login => "Login failed. Please try again.",
            Flow::SignUp => "Sign-up failed. Please try again.",
        }
    }
}

impl AuthError {
    pub fn provider(code: impl Into<String>) -> Self {
        AuthError::Provider { code: code.into() }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            AuthError::Provider { code } => Some(code),
            _ => None,
        }
    }

    /// The text shown to the user. Provider wording never leaks through:
    /// unknown codes get the flow's generic message.
    pub fn user_message(&self, flow: Flow) -> &'static str {
        self.code()
            .and_then(known_message)
            .unwrap_or(flow.generic_message())
    }
}

fn known_message(code: &str) -> Option<&'static str> {
    Some(match code {
        "EMAIL_EXISTS" => "Email already in use. Try logging in.",
        "WEAK_PASSWORD" => "Password should be at least 6 characters.",
        "INVALID_EMAIL" => "Please enter a valid email address.",
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => "Invalid email or password.",
        "USER_DISABLED" => "This account has been disabled.",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts. Please try again later.",
        _ => return None,
    })
}

/// Provider messages look like `WEAK_PASSWORD : Password should be ...`;
/// the code is the part before the first colon.
pub fn parse_code(message: &str) -> String {
    message.split(':').next().unwrap_or_default().trim().to_owned()
}
