use crate::client::AuthClient;
use crate::guard::Guard;

/// Shared state for shell route handlers.
pub struct ShellState<S> {
    pub(super) client: AuthClient<S>,
    pub(super) guard: Guard,
}

// Manual Clone: avoid derive adding an `S: Clone` bound.
impl<S> Clone for ShellState<S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            guard: self.guard.clone(),
        }
    }
}
