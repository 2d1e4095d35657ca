//! Laws of the pure state operations, checked through the public API.
use trellis::{
    core::layout::LayoutStack,
    pure::{geometry::Rect, StackSet},
    stack,
};

fn test_stack_set(n_tags: usize, n_screens: usize) -> StackSet<u8> {
    let tags = (1..=n_tags).map(|n| n.to_string());
    let screens: Vec<Rect> = (0..(n_screens as u32))
        .map(|k| Rect::new(k * 1000, 0, 1000, 800))
        .collect();

    StackSet::try_new(LayoutStack::default(), tags, screens).unwrap()
}

#[test]
fn focus_tag_then_focus_tag_is_focus_tag() {
    let mut a = test_stack_set(5, 2);
    a.insert(1);

    let mut b = a.clone();

    a.focus_tag("4");

    b.focus_tag("4");
    b.focus_tag("4");

    assert_eq!(a.current_tag(), b.current_tag());
    assert_eq!(
        a.screens().map(|s| s.workspace.tag()).collect::<Vec<_>>(),
        b.screens().map(|s| s.workspace.tag()).collect::<Vec<_>>(),
    );
}

#[test]
fn inserted_clients_are_known_and_focused() {
    let mut s = test_stack_set(3, 1);

    s.insert(7);

    assert!(s.contains(&7));
    assert_eq!(s.current_client(), Some(&7));
}

#[test]
fn moving_focus_between_workspaces_preserves_the_client_set() {
    let mut s = test_stack_set(3, 1);
    for c in 0..5 {
        s.insert(c);
    }
    s.focus_tag("2");
    s.insert(10);

    let mut before: Vec<u8> = s.clients().copied().collect();
    before.sort();

    s.move_focused_to_tag("3");
    s.focus_tag("3");
    s.move_focused_to_tag("1");

    let mut after: Vec<u8> = s.clients().copied().collect();
    after.sort();

    assert_eq!(before, after);
}

#[test]
fn focus_up_and_down_are_inverses() {
    let mut s = test_stack_set(2, 1);
    for c in 0..4 {
        s.insert(c);
    }

    let before = s.current_stack().cloned();

    s.focus_up();
    s.focus_down();
    assert_eq!(s.current_stack().cloned(), before);

    s.focus_down();
    s.focus_up();
    assert_eq!(s.current_stack().cloned(), before);
}

#[test]
fn float_then_sink_reverts_to_tiling() {
    let mut s = test_stack_set(2, 1);
    s.insert(1);
    s.insert(2);

    s.float(2, Rect::new(10, 10, 200, 200));
    assert_eq!(s.current_client(), Some(&2));

    s.sink(&2);

    assert!(s.contains(&2));
    assert_eq!(s.current_stack(), Some(&stack!(2, [1])));
}

#[test]
fn deleting_the_focus_selects_the_next_client_below() {
    let mut s = test_stack_set(2, 1);
    for c in [3, 2, 1] {
        s.insert(c);
    }

    // stack is now 1, 2, 3 with 1 focused
    s.remove_client(&1);
    assert_eq!(s.current_client(), Some(&2));

    s.remove_client(&3);
    assert_eq!(s.current_client(), Some(&2));

    s.remove_client(&2);
    assert_eq!(s.current_client(), None);
}

#[test]
fn workspace_tags_are_stable_across_screen_changes() {
    let mut s = test_stack_set(4, 2);
    s.insert(1);

    s.update_screens(vec![Rect::new(0, 0, 2000, 1000)]).unwrap();
    assert_eq!(s.ordered_tags(), vec!["1", "2", "3", "4"]);

    s.update_screens(vec![
        Rect::new(0, 0, 2000, 1000),
        Rect::new(2000, 0, 1000, 1000),
        Rect::new(3000, 0, 1000, 1000),
    ])
    .unwrap();

    assert_eq!(s.ordered_tags(), vec!["1", "2", "3", "4"]);
    assert!(s.contains(&1));
}
