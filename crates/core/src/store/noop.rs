//! Store that never retains anything.

use async_trait::async_trait;

use super::{Error, KeyValueStore};

/// Default store: every `set` is accepted and discarded, every `get` misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

#[async_trait]
impl<V, O> KeyValueStore<V, O> for NoopStore
where
    V: Send + 'static,
    O: Send + 'static,
{
    async fn get(&self, _key: &str) -> Result<Option<V>, Error> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: V, _options: O) -> Result<(), Error> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), Error> {
        Ok(())
    }
}
