//! Built-in layouts.
use crate::{
    builtin::layout::messages::{ExpandMain, IncMain, ShrinkMain},
    core::layout::{Layout, Message},
    pure::{geometry::Rect, Stack},
    Xid,
};

pub mod messages;
pub mod transformers;


/// A simple [Layout] with main and secondary regions.
///
/// The first `max_main` clients are placed in a main column on the left of
/// the screen taking up `ratio` of the available width, with the remaining
/// clients stacked in a second column to the right. Each column splits its
/// height evenly between the clients it contains. If there are no more than
/// `max_main` clients (or `max_main` is zero) a single column spans the full
/// screen.
///
/// The ratio between the main and secondary regions can be adjusted by
/// sending [ShrinkMain] and [ExpandMain] messages to this layout. The number
/// of clients in the main area can be increased or decreased by sending an
/// [IncMain] message.
#[derive(Debug, Clone, Copy)]
pub struct MainAndStack {
    max_main: u32,
    ratio: f32,
    ratio_step: f32,
}

impl MainAndStack {
    /// Create a new boxed MainAndStack layout.
    pub fn boxed(max_main: u32, ratio: f32, ratio_step: f32) -> Box<dyn Layout> {
        Box::new(Self::new(max_main, ratio, ratio_step))
    }

    /// Create a new MainAndStack layout.
    pub fn new(max_main: u32, ratio: f32, ratio_step: f32) -> Self {
        Self {
            max_main,
            ratio: ratio.clamp(0.0, 1.0),
            ratio_step,
        }
    }
}

impl Default for MainAndStack {
    fn default() -> Self {
        Self {
            max_main: 1,
            ratio: 0.6,
            ratio_step: 0.1,
        }
    }
}

impl Layout for MainAndStack {
    fn name(&self) -> String {
        "Side".to_owned()
    }

    fn boxed_clone(&self) -> Box<dyn Layout> {
        Box::new(*self)
    }

    fn layout(&mut self, s: &Stack<Xid>, r: Rect) -> (Option<Box<dyn Layout>>, Vec<(Xid, Rect)>) {
        let n = s.len() as u32;

        let positions = if n <= self.max_main || self.max_main == 0 {
            // All windows fit in a single stack (all main or all secondary)
            r.as_rows(n).iter().zip(s).map(|(r, c)| (*c, *r)).collect()
        } else {
            let split = (((r.w as f32) * self.ratio) as u32).clamp(1, r.w.saturating_sub(1).max(1));

            match r.split_at_width(split) {
                Some((main, stack)) => main
                    .as_rows(self.max_main)
                    .into_iter()
                    .chain(stack.as_rows(n.saturating_sub(self.max_main)))
                    .zip(s)
                    .map(|(r, c)| (*c, r))
                    .collect(),

                // Screen too narrow to split in two
                None => r.as_rows(n).iter().zip(s).map(|(r, c)| (*c, *r)).collect(),
            }
        };

        (None, positions)
    }

    fn handle_message(&mut self, m: &Message) -> Option<Box<dyn Layout>> {
        let before = (self.max_main, self.ratio);

        if m.downcast_ref::<ExpandMain>().is_some() {
            self.ratio = (self.ratio + self.ratio_step).clamp(0.0, 1.0);
        } else if m.downcast_ref::<ShrinkMain>().is_some() {
            self.ratio = (self.ratio - self.ratio_step).clamp(0.0, 1.0);
        } else if let Some(&IncMain(n)) = m.downcast_ref() {
            if n < 0 {
                self.max_main = self.max_main.saturating_sub((-n) as u32);
            } else {
                self.max_main += n as u32;
            }
        } else {
            return None;
        }

        if (self.max_main, self.ratio) == before {
            None // recognised but nothing changed: no refresh needed
        } else {
            Some(self.boxed_clone())
        }
    }
}

/// A fullscreen layout: every client is given the whole of the available
/// screen space with the focused client stacked on top of its siblings.
#[derive(Debug, Clone, Copy)]
pub struct Monocle;

impl Monocle {
    /// Create a new boxed Monocle layout.
    pub fn boxed() -> Box<dyn Layout> {
        Box::new(Monocle)
    }
}

impl Layout for Monocle {
    fn name(&self) -> String {
        "Mono".to_owned()
    }

    fn boxed_clone(&self) -> Box<dyn Layout> {
        Self::boxed()
    }

    fn layout(&mut self, s: &Stack<Xid>, r: Rect) -> (Option<Box<dyn Layout>>, Vec<(Xid, Rect)>) {
        // First position returned is the top of the stacking order
        let positions = std::iter::once(&s.focus)
            .chain(s.up.iter())
            .chain(s.down.iter())
            .map(|&c| (c, r))
            .collect();

        (None, positions)
    }

    fn handle_message(&mut self, _: &Message) -> Option<Box<dyn Layout>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::layout::IntoMessage, stack};
    use simple_test_case::test_case;

    #[test]
    fn message_handling() {
        let mut l = MainAndStack::new(1, 0.6, 0.1);

        l.handle_message(&IncMain(2).into_message());

        assert_eq!(l.max_main, 3);
    }

    #[test]
    fn inc_main_clamps_at_zero() {
        let mut l = MainAndStack::new(1, 0.6, 0.1);

        l.handle_message(&IncMain(-5).into_message());

        assert_eq!(l.max_main, 0);
    }

    #[test_case(2, 0.8; "expand")]
    #[test_case(10, 1.0; "expand clamps at one")]
    #[test]
    fn expand_main(n: usize, expected: f32) {
        let mut l = MainAndStack::new(1, 0.6, 0.1);

        for _ in 0..n {
            l.handle_message(&ExpandMain.into_message());
        }

        assert!((l.ratio - expected).abs() < 0.001);
    }

    #[test]
    fn shrink_main_clamps_at_zero() {
        let mut l = MainAndStack::new(1, 0.6, 0.1);

        for _ in 0..10 {
            l.handle_message(&ShrinkMain.into_message());
        }

        assert!(l.ratio.abs() < 0.001);
    }

    #[test]
    fn messages_that_change_nothing_report_no_change() {
        let mut l = MainAndStack::new(1, 1.0, 0.1);

        let res = l.handle_message(&ExpandMain.into_message());

        assert!(res.is_none());
    }

    #[test]
    fn single_client_is_fullscreen() {
        let mut l = MainAndStack::default();
        let r = Rect::new(0, 0, 1000, 800);

        let (_, positions) = l.layout(&stack!(Xid(1)), r);

        assert_eq!(positions, vec![(Xid(1), r)]);
    }

    #[test]
    fn main_and_stack_split_widths_respect_ratio() {
        let mut l = MainAndStack::new(1, 0.6, 0.1);
        let r = Rect::new(0, 0, 1000, 800);

        let (_, positions) = l.layout(&stack!(Xid(1), Xid(2), Xid(3)), r);

        assert_eq!(
            positions,
            vec![
                (Xid(1), Rect::new(0, 0, 600, 800)),
                (Xid(2), Rect::new(600, 0, 400, 400)),
                (Xid(3), Rect::new(600, 400, 400, 400)),
            ]
        );
    }

    #[test]
    fn zero_max_main_gives_a_single_column() {
        let mut l = MainAndStack::new(0, 0.6, 0.1);
        let r = Rect::new(0, 0, 1000, 800);

        let (_, positions) = l.layout(&stack!(Xid(1), Xid(2)), r);

        assert_eq!(
            positions,
            vec![
                (Xid(1), Rect::new(0, 0, 1000, 400)),
                (Xid(2), Rect::new(0, 400, 1000, 400)),
            ]
        );
    }

    #[test]
    fn monocle_places_focus_on_top() {
        let mut l = Monocle;
        let r = Rect::new(0, 0, 1000, 800);

        let (_, positions) = l.layout(&stack!([Xid(1)], Xid(2), [Xid(3)]), r);

        assert_eq!(positions[0], (Xid(2), r));
        assert_eq!(positions.len(), 3);
        assert!(positions.iter().all(|&(_, pr)| pr == r));
    }
}
