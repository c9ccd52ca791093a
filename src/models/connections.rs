use secrecy::SecretString;

/// Where the dashboard logs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub account: String,
    pub base_url: String,
    pub role: Option<String>,
}

impl ConnectionConfig {
    pub fn for_account(account: &str) -> Self {
        Self {
            account: account.to_string(),
            base_url: format!("https://{}.snowflakecomputing.com", account),
            role: None,
        }
    }
}

/// Username and password as typed on the login screen.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
        }
    }
}
