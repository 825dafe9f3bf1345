//! Read-only queries over a root snapshot

use super::RootState;
use crate::StoreResult;

/// A pure, deterministic query over a [`RootState`]
///
/// Any `Fn(&RootState) -> StoreResult<T>` is a picker, so the sector picker
/// functions compose with ordinary closures.
pub trait Picker {
    type Output;

    fn pick(&self, root: &RootState) -> StoreResult<Self::Output>;

    /// Transform the picked value
    fn map<U, F>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> U,
    {
        Map { picker: self, f }
    }

    /// Treat the not-found family as `None` instead of an error
    fn optional(self) -> Optional<Self>
    where
        Self: Sized,
    {
        Optional { picker: self }
    }
}

impl<F, T> Picker for F
where
    F: Fn(&RootState) -> StoreResult<T>,
{
    type Output = T;

    fn pick(&self, root: &RootState) -> StoreResult<T> {
        self(root)
    }
}

pub struct Map<P, F> {
    picker: P,
    f: F,
}

impl<P, F, U> Picker for Map<P, F>
where
    P: Picker,
    F: Fn(P::Output) -> U,
{
    type Output = U;

    fn pick(&self, root: &RootState) -> StoreResult<U> {
        self.picker.pick(root).map(&self.f)
    }
}

pub struct Optional<P> {
    picker: P,
}

impl<P: Picker> Picker for Optional<P> {
    type Output = Option<P::Output>;

    fn pick(&self, root: &RootState) -> StoreResult<Option<P::Output>> {
        match self.picker.pick(root) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WindowHandle;
    use crate::store::sectors::window::{pick_last_focused_window, pick_window};
    use crate::StoreError;

    #[test]
    fn missing_window_is_a_typed_error() {
        let root = RootState::default();
        assert_eq!(
            pick_window(WindowHandle::new(4)).pick(&root),
            Err(StoreError::WindowNotFound(WindowHandle::new(4)))
        );
        assert_eq!(
            pick_last_focused_window().pick(&root),
            Err(StoreError::NoValidWindow)
        );
    }

    #[test]
    fn combinators_compose() {
        let root = RootState::default();
        let title = pick_window(WindowHandle::new(4)).map(|w| w.title).optional();
        assert_eq!(title.pick(&root), Ok(None));

        let count = |root: &RootState| Ok::<_, StoreError>(root.windows().len());
        assert_eq!(count.map(|n| n * 2).pick(&root), Ok(0));
    }
}
