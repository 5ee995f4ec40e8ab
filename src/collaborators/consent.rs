//! Consent-policy collaborator contract.

use async_trait::async_trait;

/// What the build gate asks the consent collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentRequest {
    /// A named consent policy.
    Policy(String),
    /// A list of consent purposes that must all be granted.
    Purposes(Vec<String>),
}

/// Evaluates consent decisions for the build gate.
#[async_trait]
pub trait ConsentPolicy: Send + Sync + 'static {
    /// Resolves to `true` when the element may build.
    async fn evaluate(&self, request: &ConsentRequest) -> bool;
}
