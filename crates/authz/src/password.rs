use anyhow::Context;

/// One-way credential hashing.
pub trait PasswordHasher: Send + Sync {
    /// Produce the stored representation of `plaintext`.
    fn hash(&self, plaintext: &str) -> anyhow::Result<String>;

    /// Check `plaintext` against a stored representation.
    fn verify(&self, plaintext: &str, hashed: &str) -> anyhow::Result<bool>;
}

/// bcrypt-backed hasher.
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> anyhow::Result<String> {
        bcrypt::hash(plaintext, self.cost)
            .with_context(|| format!("failed to hash password with cost {}", self.cost))
    }

    fn verify(&self, plaintext: &str, hashed: &str) -> anyhow::Result<bool> {
        bcrypt::verify(plaintext, hashed).context("failed to verify password hash")
    }
}
