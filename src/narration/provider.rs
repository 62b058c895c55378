/// Ordered failover over interchangeable providers (voices, credentials, endpoints).
///
/// State is explicit: the chain sits on `current_index` until a quota or rate-limit signal
/// advances it; once every provider has been used up it is `exhausted` for the rest of the
/// run.
#[derive(Debug)]
pub struct ProviderChain<P> {
    providers: Vec<P>,
    current_index: usize,
    exhausted: bool,
}

/// Snapshot of a chain's position, for reports and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainState {
    pub current_index: usize,
    pub len: usize,
    pub exhausted: bool,
}

impl<P> ProviderChain<P> {
    /// Chain starting at the first provider; an empty chain starts exhausted.
    pub fn new(providers: Vec<P>) -> Self {
        let exhausted = providers.is_empty();
        Self {
            providers,
            current_index: 0,
            exhausted,
        }
    }

    /// Provider to use now, or `None` once exhausted.
    pub fn current(&self) -> Option<&P> {
        if self.exhausted {
            return None;
        }
        self.providers.get(self.current_index)
    }

    /// Move to the next provider after a quota/rate-limit signal.
    ///
    /// Returns the new provider, or `None` when that was the last one.
    pub fn advance(&mut self) -> Option<&P> {
        if self.exhausted {
            return None;
        }
        if self.current_index + 1 < self.providers.len() {
            self.current_index += 1;
            tracing::warn!(
                index = self.current_index,
                of = self.providers.len(),
                "provider chain advanced"
            );
            self.providers.get(self.current_index)
        } else {
            self.exhausted = true;
            tracing::warn!("provider chain exhausted");
            None
        }
    }

    /// `true` once every provider has been used up.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Current position.
    pub fn state(&self) -> ChainState {
        ChainState {
            current_index: self.current_index,
            len: self.providers.len(),
            exhausted: self.exhausted,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/provider.rs"]
mod tests;
