/// Supplies the bearer token attached to every request.
///
/// Queried per request, so a provider may rotate tokens without rebuilding
/// the client.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A fixed token (or none), e.g. taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|token| !token.trim().is_empty()))
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}
