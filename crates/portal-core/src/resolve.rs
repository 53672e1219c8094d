//! Drop position resolution for pointer-driven reordering.
//!
//! Given the rows of a container (minus the row being dragged) and the pointer's
//! vertical coordinate, [`resolve`] picks the row the dragged item should be
//! inserted in front of. Geometry is never cached here; callers pass the bounds
//! of the current layout pass on every call.

/// Vertical extent of a row in the same coordinate frame as the pointer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Span {
    pub top: f32,
    pub height: f32,
}

impl Span {
    pub fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }
}

/// Anything with a vertical extent that can serve as a drop reference.
pub trait Candidate {
    fn top(&self) -> f32;
    fn height(&self) -> f32;

    fn midpoint(&self) -> f32 {
        self.top() + self.height() / 2.0
    }
}

impl Candidate for Span {
    fn top(&self) -> f32 {
        self.top
    }

    fn height(&self) -> f32 {
        self.height
    }
}

impl<C: Candidate + ?Sized> Candidate for &C {
    fn top(&self) -> f32 {
        (**self).top()
    }

    fn height(&self) -> f32 {
        (**self).height()
    }
}

/// Where a dropped item lands relative to the remaining rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropSlot<T> {
    /// Insert immediately before this candidate.
    Before(T),
    /// No candidate qualifies; append as the last item.
    EndOfList,
}

impl<T> DropSlot<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DropSlot<U> {
        match self {
            DropSlot::Before(candidate) => DropSlot::Before(f(candidate)),
            DropSlot::EndOfList => DropSlot::EndOfList,
        }
    }
}

/// Resolve the candidate that should follow the dragged item once dropped.
///
/// A candidate is eligible while the cursor is strictly above its midpoint.
/// Among eligible candidates the one whose midpoint is closest to the cursor
/// wins; on equal offsets the first one in iteration order is kept.
pub fn resolve<I>(candidates: I, cursor_y: f32) -> DropSlot<I::Item>
where
    I: IntoIterator,
    I::Item: Candidate,
{
    let mut closest_offset = f32::NEG_INFINITY;
    let mut closest = None;

    for candidate in candidates {
        let offset = cursor_y - candidate.midpoint();
        if offset < 0.0 && offset > closest_offset {
            closest_offset = offset;
            closest = Some(candidate);
        }
    }

    match closest {
        Some(candidate) => DropSlot::Before(candidate),
        None => DropSlot::EndOfList,
    }
}

/// Same as [`resolve`], reporting the winner by its position in `candidates`.
pub fn resolve_index<C: Candidate>(candidates: &[C], cursor_y: f32) -> DropSlot<usize> {
    resolve(candidates.iter().enumerate().map(Indexed), cursor_y).map(|Indexed((ix, _))| ix)
}

struct Indexed<'a, C>((usize, &'a C));

impl<C: Candidate> Candidate for Indexed<'_, C> {
    fn top(&self) -> f32 {
        self.0.1.top()
    }

    fn height(&self) -> f32 {
        self.0.1.height()
    }
}
