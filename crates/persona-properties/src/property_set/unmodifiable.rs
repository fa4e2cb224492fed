use super::{Element, PropertySet, Snapshot};
use persona_core::{Result, UsageError, ValueType};
use std::sync::Arc;

/// Read-only view over another property set
///
/// Mutators fail with `UsageError::Unsupported` before the delegate is
/// touched. Reads and `refresh` pass through.
pub struct Unmodifiable<E: Element> {
    inner: Arc<dyn PropertySet<E>>,
}

impl<E: Element> Unmodifiable<E> {
    /// Wrap `inner`
    pub fn new(inner: Arc<dyn PropertySet<E>>) -> Self {
        Self { inner }
    }

    fn reject<T>(operation: &'static str) -> Result<T> {
        Err(UsageError::Unsupported { operation }.into())
    }
}

impl<E: Element> Clone for Unmodifiable<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Element> std::fmt::Debug for Unmodifiable<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unmodifiable")
            .field("element_type", self.inner.element_type())
            .finish_non_exhaustive()
    }
}

impl<E: Element> PropertySet<E> for Unmodifiable<E> {
    fn element_type(&self) -> &ValueType {
        self.inner.element_type()
    }

    fn get_all(&self) -> Result<Snapshot<E>> {
        self.inner.get_all()
    }

    fn get_single(&self) -> Result<Option<E>> {
        self.inner.get_single()
    }

    fn set_all(&self, _values: Vec<E>) -> Result<()> {
        Self::reject("set_all")
    }

    fn set_single(&self, _value: Option<E>) -> Result<()> {
        Self::reject("set_single")
    }

    fn add(&self, _value: E) -> Result<bool> {
        Self::reject("add")
    }

    fn add_all(&self, _values: Vec<E>) -> Result<bool> {
        Self::reject("add_all")
    }

    fn remove(&self, _value: &E) -> Result<bool> {
        Self::reject("remove")
    }

    fn refresh(&self) -> Result<()> {
        self.inner.refresh()
    }

    fn init(&self, _values: Vec<E>) -> Result<()> {
        Self::reject("init")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property_set::Transient;
    use proptest::prelude::*;

    fn wrapped(values: Vec<i64>) -> (Arc<Transient<i64>>, Unmodifiable<i64>) {
        let inner = Arc::new(Transient::with_values(ValueType::Integer, values));
        let view = Unmodifiable::new(inner.clone() as Arc<dyn PropertySet<i64>>);
        (inner, view)
    }

    #[test]
    fn test_reads_pass_through() {
        let (inner, view) = wrapped(vec![1, 2]);
        assert_eq!(view.get_all().unwrap().len(), 2);
        inner.add(3).unwrap();
        assert_eq!(view.get_all().unwrap().len(), 3);
        assert_eq!(view.get_single().unwrap(), Some(1));
        assert_eq!(view.element_type(), &ValueType::Integer);
        view.refresh().unwrap();
    }

    #[test]
    fn test_add_is_rejected() {
        let (inner, view) = wrapped(vec![]);
        let err = view.add(5).unwrap_err();
        assert!(err.is_usage());
        assert_eq!(
            err.as_usage(),
            Some(&UsageError::Unsupported { operation: "add" })
        );
        assert!(inner.get_all().unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn every_mutator_leaves_delegate_untouched(
            initial in proptest::collection::vec(0i64..10, 0..8),
            value in 0i64..20,
            op in 0usize..6,
        ) {
            let (inner, view) = wrapped(initial);
            let before = inner.get_all().unwrap();
            let outcome = match op {
                0 => view.add(value).map(|_| ()),
                1 => view.add_all(vec![value]).map(|_| ()),
                2 => view.set_all(vec![value]),
                3 => view.set_single(Some(value)),
                4 => view.remove(&value).map(|_| ()),
                _ => view.init(vec![value]),
            };
            prop_assert!(outcome.unwrap_err().is_usage());
            prop_assert!(Arc::ptr_eq(&before, &inner.get_all().unwrap()));
        }
    }
}
