/// Linear pager over `[0, total)`. Moves by one step and clamps at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Navigator {
    current: usize,
    total: usize,
}

impl Navigator {
    pub(crate) fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    /// `None` when there are no questions at all.
    pub(crate) fn current(&self) -> Option<usize> {
        (self.current < self.total).then_some(self.current)
    }

    pub(crate) fn next(&mut self) -> bool {
        if self.total > 0 && self.current < self.total - 1 {
            self.current += 1;
            return true;
        }
        false
    }

    pub(crate) fn previous(&mut self) -> bool {
        if self.current > 0 && self.total > 0 {
            self.current -= 1;
            return true;
        }
        false
    }

    pub(crate) fn can_previous(&self) -> bool {
        self.current().is_some_and(|index| index > 0)
    }

    pub(crate) fn can_next(&self) -> bool {
        self.current().is_some_and(|index| index + 1 < self.total)
    }

    pub(crate) fn is_last(&self) -> bool {
        self.current().is_some_and(|index| index + 1 == self.total)
    }

    pub(crate) fn counter(&self) -> Option<String> {
        self.current().map(|index| format!("Question {} of {}", index + 1, self.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn moves_one_step_and_clamps() {
        let mut nav = Navigator::new(3);
        assert_eq!(nav.current(), Some(0));
        assert!(!nav.previous());
        assert!(nav.next());
        assert!(nav.next());
        assert!(!nav.next());
        assert_eq!(nav.current(), Some(2));
        assert!(nav.is_last());
        assert!(nav.previous());
        assert_eq!(nav.current(), Some(1));
    }

    #[test]
    fn affordances_follow_position() {
        let mut nav = Navigator::new(2);
        assert!(!nav.can_previous());
        assert!(nav.can_next());
        assert!(!nav.is_last());
        assert_eq!(nav.counter().as_deref(), Some("Question 1 of 2"));

        nav.next();
        assert!(nav.can_previous());
        assert!(!nav.can_next());
        assert!(nav.is_last());
        assert_eq!(nav.counter().as_deref(), Some("Question 2 of 2"));
    }

    #[test]
    fn single_question_is_first_and_last() {
        let nav = Navigator::new(1);
        assert!(!nav.can_previous());
        assert!(!nav.can_next());
        assert!(nav.is_last());
    }

    #[test]
    fn empty_store_has_no_current_question() {
        let mut nav = Navigator::new(0);
        assert_eq!(nav.current(), None);
        assert!(!nav.next());
        assert!(!nav.previous());
        assert!(!nav.is_last());
        assert_eq!(nav.counter(), None);
    }

    #[test]
    fn index_stays_in_bounds_under_arbitrary_moves() {
        for total in 0..6usize {
            let mut nav = Navigator::new(total);
            let mut rng = StdRng::seed_from_u64(0x9e37_79b9 ^ total as u64);
            for _ in 0..500 {
                let before = nav.current();
                if rng.gen_bool(0.5) {
                    nav.next();
                } else {
                    nav.previous();
                }
                match nav.current() {
                    Some(index) => {
                        assert!(index < total);
                        let before = before.expect("index only exists when total > 0");
                        assert!(index.abs_diff(before) <= 1);
                    }
                    None => assert_eq!(total, 0),
                }
            }
        }
    }
}
