use super::*;

#[test]
fn starts_at_initial_path_with_empty_history() {
    let nav = MemoryNavigator::new("/admin/students");
    assert_eq!(nav.current_path(), "/admin/students");
    assert!(nav.history().is_empty());
    assert!(nav.last_push().is_none());
}

#[test]
fn push_moves_and_records() {
    let nav = MemoryNavigator::default();
    assert_eq!(nav.current_path(), "/");

    nav.push("/login");
    nav.push("/chat");

    assert_eq!(nav.current_path(), "/chat");
    assert_eq!(nav.history(), vec!["/login".to_owned(), "/chat".to_owned()]);
    assert_eq!(nav.last_push().as_deref(), Some("/chat"));
}
