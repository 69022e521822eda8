//! Key-prefixing decorator for any store.

use async_trait::async_trait;

use super::{Error, KeyValueStore};

/// Wraps a store and prefixes every key with a fixed namespace.
///
/// Decorators compose: `Namespaced::new(Namespaced::new(store, "a:"), "b:")`
/// writes `a:b:key` to `store`.
#[derive(Debug, Clone)]
pub struct Namespaced<S> {
    inner: S,
    prefix: String,
}

impl<S> Namespaced<S> {
    pub fn new(inner: S, prefix: impl Into<String>) -> Self {
        Self { inner, prefix: prefix.into() }
    }

    /// The key as seen by the wrapped store.
    pub fn namespaced_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl<S, V, O> KeyValueStore<V, O> for Namespaced<S>
where
    S: KeyValueStore<V, O>,
    V: Send + 'static,
    O: Send + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, Error> {
        self.inner.get(&self.namespaced_key(key)).await
    }

    async fn set(&self, key: &str, value: V, options: O) -> Result<(), Error> {
        self.inner.set(&self.namespaced_key(key), value, options).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.inner.delete(&self.namespaced_key(key)).await
    }
}
