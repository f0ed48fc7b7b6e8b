use super::*;

#[test]
fn recording_notifier_keeps_order() {
    let notifier = RecordingNotifier::new();
    notifier.notify(Notice::error("first"));
    notifier.notify(Notice::success("second"));

    let notices = notifier.notices();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0], Notice::error("first"));
    assert_eq!(notices[1].level, NoticeLevel::Success);
}

#[test]
fn recording_notifier_errors_filters_level() {
    let notifier = RecordingNotifier::new();
    notifier.notify(Notice::success("Login successful"));
    notifier.notify(Notice::error("System error"));
    assert_eq!(notifier.errors(), vec!["System error".to_owned()]);
}

#[test]
fn take_drains() {
    let notifier = RecordingNotifier::new();
    notifier.notify(Notice::error("x"));
    assert_eq!(notifier.take().len(), 1);
    assert!(notifier.notices().is_empty());
}

#[test]
fn tracing_notifier_accepts_every_level() {
    let notifier = TracingNotifier;
    for level in [NoticeLevel::Success, NoticeLevel::Info, NoticeLevel::Warning, NoticeLevel::Error] {
        notifier.notify(Notice { level, message: "m".into() });
    }
}
