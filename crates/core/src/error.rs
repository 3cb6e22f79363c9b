#[derive(Debug)]
pub struct SaltError {
    pub message: String,
}

impl std::fmt::Display for SaltError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SaltError {}

impl From<String> for SaltError {
    fn from(message: String) -> Self {
        SaltError { message }
    }
}

impl From<&str> for SaltError {
    fn from(message: &str) -> Self {
        SaltError { message: message.to_string() }
    }
}
