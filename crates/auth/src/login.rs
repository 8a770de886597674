//! Login providers that don't need a platform SDK.

use async_trait::async_trait;
use minireq_types::{Error, LoginProvider, Result};

/// Hands out a fixed, caller-supplied login code.
///
/// Used by the CLI (`minireq login --code ...`) and by tests.
pub struct StaticLoginProvider {
    code: String,
}

impl StaticLoginProvider {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

#[async_trait]
impl LoginProvider for StaticLoginProvider {
    async fn login(&self) -> Result<String> {
        Ok(self.code.clone())
    }
}

/// A provider that always fails; for contexts where interactive login is impossible.
pub struct NoLoginProvider;

#[async_trait]
impl LoginProvider for NoLoginProvider {
    async fn login(&self) -> Result<String> {
        Err(Error::Refresh(
            "no login provider configured; run `minireq login --code <code>`".into(),
        ))
    }
}
