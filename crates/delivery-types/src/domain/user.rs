use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Driver => "driver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account. The hash is whatever the password hasher produced
/// and is never serialized back out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub phone: String,
}

impl User {
    pub fn new(
        username: String,
        password_hash: String,
        role: Role,
        phone: String,
    ) -> anyhow::Result<Self> {
        Self::validate_username(&username)?;
        Ok(Self {
            username,
            password_hash,
            role,
            phone,
        })
    }

    pub fn validate_username(username: &str) -> anyhow::Result<()> {
        if username.trim().is_empty() {
            anyhow::bail!("username empty");
        }
        Ok(())
    }
}
