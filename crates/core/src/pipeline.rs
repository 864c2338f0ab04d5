//! Filter/sort views layered over the canonical result list.
//!
//! Every operation is a pure function of the current [`ListState`]: it
//! returns a fresh state plus the list that becomes visible, and the caller
//! swaps the state in one assignment.
//!
//! Precedence:
//!
//! | operation        | source                                   | visible           |
//! |------------------|------------------------------------------|-------------------|
//! | `filter(p)`      | sorted view if non-empty, else canonical | filtered view     |
//! | `sort(c)`        | filtered view if non-empty, else canonical | sorted view     |
//! | `remove_filter`  | canonical, re-sorted by retained comparator | sorted or canonical |
//! | `remove_sort`    | -                                        | filtered if non-empty, else canonical |

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

#[derive(Clone)]
pub struct ListState<T> {
    canonical: Arc<[T]>,
    filtered: Arc<[T]>,
    sorted: Arc<[T]>,
    comparator: Option<Comparator<T>>,
}

/// Result of one pipeline operation.
pub struct Transition<T> {
    pub state: ListState<T>,
    pub visible: Arc<[T]>,
}

/// Items of `source` satisfying `predicate`, in source order.
pub fn derive_filtered<T, P>(source: &[T], predicate: &P) -> Arc<[T]>
where
    T: Clone,
    P: Fn(&T) -> bool + ?Sized,
{
    source.iter().filter(|&item| predicate(item)).cloned().collect()
}

/// `source` ordered by `comparator`; ties keep source order.
pub fn derive_sorted<T, C>(source: &[T], comparator: &C) -> Arc<[T]>
where
    T: Clone,
    C: Fn(&T, &T) -> Ordering + ?Sized,
{
    let mut items = source.to_vec();
    items.sort_by(|a, b| comparator(a, b));
    items.into()
}

impl<T: Clone> ListState<T> {
    #[must_use]
    pub fn empty() -> Self {
        Self::with_canonical(Vec::new())
    }

    /// State after a successful search: derived views and comparator reset.
    #[must_use]
    pub fn with_canonical(items: Vec<T>) -> Self {
        let empty: Arc<[T]> = Arc::from(Vec::new());
        Self {
            canonical: items.into(),
            filtered: Arc::clone(&empty),
            sorted: empty,
            comparator: None,
        }
    }

    #[must_use]
    pub fn canonical(&self) -> &Arc<[T]> {
        &self.canonical
    }

    #[must_use]
    pub fn filtered(&self) -> &Arc<[T]> {
        &self.filtered
    }

    #[must_use]
    pub fn sorted(&self) -> &Arc<[T]> {
        &self.sorted
    }

    #[must_use]
    pub fn has_comparator(&self) -> bool {
        self.comparator.is_some()
    }

    pub fn filter<P>(&self, predicate: &P) -> Transition<T>
    where
        P: Fn(&T) -> bool + ?Sized,
    {
        let source = if self.sorted.is_empty() {
            &self.canonical
        } else {
            &self.sorted
        };
        let filtered = derive_filtered(source, predicate);
        Transition {
            visible: Arc::clone(&filtered),
            state: Self {
                filtered,
                ..self.clone()
            },
        }
    }

    pub fn sort(&self, comparator: Comparator<T>) -> Transition<T> {
        let source = if self.filtered.is_empty() {
            &self.canonical
        } else {
            &self.filtered
        };
        let sorted = derive_sorted(source, comparator.as_ref());
        Transition {
            visible: Arc::clone(&sorted),
            state: Self {
                sorted,
                comparator: Some(comparator),
                ..self.clone()
            },
        }
    }

    /// Drop the filtered view. A retained comparator is re-applied to the
    /// whole canonical list, so the sort preference survives.
    pub fn remove_filter(&self) -> Transition<T> {
        let empty: Arc<[T]> = Arc::from(Vec::new());
        match &self.comparator {
            Some(comparator) => {
                let sorted = derive_sorted(&self.canonical, comparator.as_ref());
                Transition {
                    visible: Arc::clone(&sorted),
                    state: Self {
                        filtered: empty,
                        sorted,
                        ..self.clone()
                    },
                }
            }
            None => Transition {
                visible: Arc::clone(&self.canonical),
                state: Self {
                    filtered: empty,
                    ..self.clone()
                },
            },
        }
    }

    /// Drop the sorted view and the comparator. The predicate is never
    /// retained, so the filtered view is shown as-is rather than recomputed.
    pub fn remove_sort(&self) -> Transition<T> {
        let visible = if self.filtered.is_empty() {
            Arc::clone(&self.canonical)
        } else {
            Arc::clone(&self.filtered)
        };
        Transition {
            visible,
            state: Self {
                sorted: Arc::from(Vec::new()),
                comparator: None,
                ..self.clone()
            },
        }
    }
}

impl<T: Clone> Default for ListState<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for ListState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListState")
            .field("canonical", &self.canonical)
            .field("filtered", &self.filtered)
            .field("sorted", &self.sorted)
            .field("comparator", &self.comparator.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn descending() -> Comparator<i32> {
        Arc::new(|a: &i32, b: &i32| b.cmp(a))
    }

    fn is_even(n: &i32) -> bool {
        n % 2 == 0
    }

    fn visible(t: &Transition<i32>) -> Vec<i32> {
        t.visible.to_vec()
    }

    #[test]
    fn filter_then_sort_sorts_the_filtered_set() {
        let state = ListState::with_canonical(vec![1, 2, 3, 4, 5]);
        let filtered = state.filter(&is_even);
        assert_eq!(visible(&filtered), vec![2, 4]);

        let sorted = filtered.state.sort(descending());
        assert_eq!(visible(&sorted), vec![4, 2]);
    }

    #[test]
    fn sort_then_filter_filters_the_sorted_set() {
        let state = ListState::with_canonical(vec![3, 1, 4, 2, 5]);
        let sorted = state.sort(descending());
        assert_eq!(visible(&sorted), vec![5, 4, 3, 2, 1]);

        let filtered = sorted.state.filter(&is_even);
        assert_eq!(visible(&filtered), vec![4, 2]);
    }

    #[test]
    fn walkthrough_remove_filter_then_remove_sort() {
        let state = ListState::with_canonical(vec![1, 2, 3, 4, 5]);
        let t = state.filter(&is_even);
        assert_eq!(visible(&t), vec![2, 4]);
        let t = t.state.sort(descending());
        assert_eq!(visible(&t), vec![4, 2]);
        let t = t.state.remove_filter();
        assert_eq!(visible(&t), vec![5, 4, 3, 2, 1]);
        // The filtered view was cleared by remove_filter, so only the
        // canonical list is left once sorting goes too.
        let t = t.state.remove_sort();
        assert_eq!(visible(&t), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn remove_filter_without_comparator_shows_canonical() {
        let state = ListState::with_canonical(vec![5, 1, 4]);
        let t = state.filter(&is_even).state.remove_filter();
        assert_eq!(visible(&t), vec![5, 1, 4]);
        assert!(t.state.filtered().is_empty());
        assert!(t.state.sorted().is_empty());
    }

    #[test]
    fn empty_filter_result_is_visible_but_not_a_sort_source() {
        let state = ListState::with_canonical(vec![1, 3, 5]);
        let t = state.filter(&is_even);
        assert!(t.visible.is_empty());

        let t = t.state.sort(descending());
        assert_eq!(visible(&t), vec![5, 3, 1]);
    }

    #[test]
    fn remove_sort_clears_comparator() {
        let state = ListState::with_canonical(vec![2, 1]);
        let t = state.sort(descending()).state.remove_sort();
        assert!(!t.state.has_comparator());
        assert_eq!(visible(&t), vec![2, 1]);

        let t = t.state.remove_filter();
        assert_eq!(visible(&t), vec![2, 1]);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let state = ListState::with_canonical(vec![(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')]);
        let by_key: Comparator<(i32, char)> = Arc::new(|a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0));
        let t = state.sort(by_key);
        assert_eq!(t.visible.to_vec(), vec![(0, 'b'), (0, 'd'), (1, 'a'), (1, 'c')]);
    }

    #[test]
    fn transitions_leave_the_previous_state_untouched() {
        let state = ListState::with_canonical(vec![1, 2, 3]);
        let _ = state.filter(&is_even);
        let _ = state.sort(descending());
        assert!(state.filtered().is_empty());
        assert!(state.sorted().is_empty());
        assert!(!state.has_comparator());
    }

    fn sort_vec(mut items: Vec<i32>, desc: bool) -> Vec<i32> {
        items.sort_by(|a, b| if desc { b.cmp(a) } else { a.cmp(b) });
        items
    }

    proptest! {
        #[test]
        fn proptest_filter_then_sort(items in proptest::collection::vec(-50i32..50, 0..40), modulus in 2i32..5) {
            let keep = move |n: &i32| n.rem_euclid(modulus) == 0;
            let state = ListState::with_canonical(items.clone());
            let t = state.filter(&keep).state.sort(descending());

            let filtered: Vec<i32> = items.iter().copied().filter(|n| keep(n)).collect();
            let expected = if filtered.is_empty() {
                sort_vec(items, true)
            } else {
                sort_vec(filtered, true)
            };
            prop_assert_eq!(t.visible.to_vec(), expected);
        }

        #[test]
        fn proptest_sort_then_filter(items in proptest::collection::vec(-50i32..50, 0..40), modulus in 2i32..5) {
            let keep = move |n: &i32| n.rem_euclid(modulus) == 0;
            let state = ListState::with_canonical(items.clone());
            let t = state.sort(descending()).state.filter(&keep);

            let expected: Vec<i32> = sort_vec(items, true).into_iter().filter(|n| keep(n)).collect();
            prop_assert_eq!(t.visible.to_vec(), expected);
        }

        #[test]
        fn proptest_remove_filter_restores_sort_over_full_list(items in proptest::collection::vec(-50i32..50, 0..40), modulus in 2i32..5) {
            let keep = move |n: &i32| n.rem_euclid(modulus) == 0;
            let state = ListState::with_canonical(items.clone());
            let t = state.sort(descending()).state.filter(&keep).state.remove_filter();
            prop_assert_eq!(t.visible.to_vec(), sort_vec(items, true));
        }

        #[test]
        fn proptest_remove_sort_falls_back_to_filter_or_canonical(items in proptest::collection::vec(-50i32..50, 0..40), modulus in 2i32..5) {
            let keep = move |n: &i32| n.rem_euclid(modulus) == 0;
            let state = ListState::with_canonical(items.clone());
            let t = state.filter(&keep).state.sort(descending()).state.remove_sort();

            let filtered: Vec<i32> = items.iter().copied().filter(|n| keep(n)).collect();
            let expected = if filtered.is_empty() { items } else { filtered };
            prop_assert_eq!(t.visible.to_vec(), expected);
        }
    }
}
