use super::StubError;

type CloseHook<'a> = Box<dyn FnOnce() + 'a>;

/// Forward-only, non-restartable iterator over host query results.
///
/// The host-side handle is released by [`ResultsIterator::close`] or, if the
/// caller never closes it, when the iterator is dropped.
pub struct ResultsIterator<'a, T> {
    inner: Box<dyn Iterator<Item = Result<T, StubError>> + 'a>,
    on_close: Option<CloseHook<'a>>,
}

impl<'a, T: 'a> ResultsIterator<'a, T> {
    pub fn new<I>(inner: I) -> Self
    where
        I: Iterator<Item = Result<T, StubError>> + 'a,
    {
        Self {
            inner: Box::new(inner),
            on_close: None,
        }
    }

    /// Iterator over already-materialized rows
    pub fn from_rows(rows: Vec<T>) -> Self {
        Self::new(rows.into_iter().map(Ok))
    }

    /// Registers a callback run exactly once when the iterator is released
    pub fn with_close_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + 'a,
    {
        self.on_close = Some(Box::new(hook));
        self
    }
}

impl<T> ResultsIterator<'_, T> {
    /// Releases the host-side handle
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(hook) = self.on_close.take() {
            hook();
        }
    }
}

impl<T> Iterator for ResultsIterator<'_, T> {
    type Item = Result<T, StubError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<T> Drop for ResultsIterator<'_, T> {
    fn drop(&mut self) {
        self.release();
    }
}
