//! Secrets read from the environment.

use std::fmt;
use thiserror::Error;

use crate::settings::TerminalSettings;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CredentialsError {
    #[error("Missing terminal credentials: {0:?}")]
    Missing(Vec<String>),

    #[error("Terminal login must be numeric")]
    NonNumericLogin,

    #[error("{0} not found")]
    MissingApiKey(String),
}

/// Terminal login.
#[derive(Clone, PartialEq)]
pub struct TerminalCredentials {
    pub server: String,
    pub login: u64,
    pub password: String,
}

impl TerminalCredentials {
    /// Read from the variables named in `settings`.
    pub fn from_env(settings: &TerminalSettings) -> Result<Self, CredentialsError> {
        Self::from_lookup(settings, |name| std::env::var(name).ok())
    }

    /// Read through an arbitrary lookup. Every missing variable is reported
    /// at once.
    pub fn from_lookup<F>(settings: &TerminalSettings, lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let server = read(&settings.server_env);
        let login = read(&settings.login_env);
        let password = read(&settings.password_env);

        let missing: Vec<String> = [
            (&settings.server_env, server.is_none()),
            (&settings.login_env, login.is_none()),
            (&settings.password_env, password.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name.to_uppercase())
        .collect();

        match (server, login, password) {
            (Some(server), Some(login), Some(password)) => {
                let login = login
                    .trim()
                    .parse()
                    .map_err(|_| CredentialsError::NonNumericLogin)?;
                Ok(Self {
                    server,
                    login,
                    password,
                })
            }
            _ => Err(CredentialsError::Missing(missing)),
        }
    }
}

impl fmt::Debug for TerminalCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalCredentials")
            .field("server", &self.server)
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

/// API key from the variable `env_name`.
pub fn api_key(env_name: &str) -> Result<String, CredentialsError> {
    std::env::var(env_name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CredentialsError::MissingApiKey(env_name.to_string()))
}
