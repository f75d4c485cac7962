//! Presence, termination and settings behaviour across several live handles.

use chrono::Duration;
use opencollab::models::{Role, Settings};
use opencollab::session::{JoinRequest, SessionError, SessionEvent, SessionHandle, TERMINATION_NOTICE};
use opencollab::store::{RealtimeStore, StorePath};
use std::collections::BTreeSet;
use tokio::time::{timeout, Duration as TokioDuration};

fn join(store: &RealtimeStore, code: &str, name: &str, role: Role) -> SessionHandle {
    let request = JoinRequest { participant_id: None, name: name.to_string(), role, max_age: Duration::minutes(120) };
    SessionHandle::join(store, code, request).expect("join should succeed")
}

/// Wait for the first event matching `pred`, skipping others.
async fn wait_for<F>(handle: &mut SessionHandle, mut pred: F) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    timeout(TokioDuration::from_secs(2), async {
        loop {
            let event = handle.next_event().await.expect("handle should be alive");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event should arrive in time")
}

async fn quiet(handle: &mut SessionHandle) -> bool {
    timeout(TokioDuration::from_millis(100), handle.next_event()).await.is_err()
}

fn names(handle: &SessionHandle) -> BTreeSet<String> {
    handle.roster().into_iter().map(|p| p.name).collect()
}

#[tokio::test]
async fn candidate_sees_termination_and_becomes_read_only() {
    let store = RealtimeStore::new();
    let mut interviewer = join(&store, "482913", "Interviewer", Role::Interviewer);
    let mut asha = join(&store, "482913", "Asha", Role::Candidate);

    let expected: BTreeSet<String> = ["Asha", "Interviewer"].into_iter().map(String::from).collect();
    assert_eq!(names(&asha), expected);
    wait_for(&mut interviewer, |e| matches!(e, SessionEvent::Joined(p) if p.name == "Asha")).await;
    assert_eq!(names(&interviewer), expected);
    assert_eq!(interviewer.roster_label(), "2 users online");

    asha.write_document("def solve():\n    return 42").unwrap();
    wait_for(&mut interviewer, |e| matches!(e, SessionEvent::DocumentChanged(_))).await;

    let outcome = interviewer.end_session(None).unwrap();
    assert!(!outcome.already_terminated);
    assert_eq!(outcome.record.terminated_by, "Interviewer");

    let event = wait_for(&mut asha, |e| matches!(e, SessionEvent::Terminated(_))).await;
    assert_eq!(event, SessionEvent::Terminated(outcome.record.clone()));
    assert!(asha.is_read_only());
    assert!(!TERMINATION_NOTICE.is_empty());
    assert!(matches!(asha.write_document("x"), Err(SessionError::ReadOnly)));
    assert!(matches!(asha.set_language("python"), Err(SessionError::ReadOnly)));
    // The interviewer keeps a writable view.
    assert!(!interviewer.is_read_only());

    let final_code = store.get(&StorePath::parse("sessions/482913/finalCode").unwrap());
    assert_eq!(final_code["content"], "def solve():\n    return 42");
    assert_eq!(final_code["lineCount"], 2);
    let preserved = store.get(&StorePath::parse("sessions/482913/preservedParticipants").unwrap());
    assert_eq!(preserved.as_object().unwrap().len(), 2);

    // Nobody may join once ended.
    let late = JoinRequest { participant_id: None, name: "Late".into(), role: Role::Candidate, max_age: Duration::minutes(120) };
    assert!(matches!(SessionHandle::join(&store, "482913", late), Err(SessionError::Terminated)));

    asha.teardown();
    interviewer.teardown();
}

#[tokio::test]
async fn termination_is_idempotent() {
    let store = RealtimeStore::new();
    let mut interviewer = join(&store, "482913", "Interviewer", Role::Interviewer);
    let first = interviewer.end_session(Some("python".into())).unwrap();
    tokio::time::sleep(TokioDuration::from_millis(5)).await;
    let second = interviewer.end_session(None).unwrap();
    assert!(second.already_terminated);
    assert_eq!(second.record, first.record);
    let language = store.get(&StorePath::parse("sessions/482913/finalCode/language").unwrap());
    assert_eq!(language, "python");
    interviewer.teardown();
}

#[tokio::test]
async fn candidates_cannot_end_sessions() {
    let store = RealtimeStore::new();
    let mut interviewer = join(&store, "482913", "Interviewer", Role::Interviewer);
    let mut asha = join(&store, "482913", "Asha", Role::Candidate);
    assert!(matches!(asha.end_session(None), Err(SessionError::Forbidden(_))));
    assert!(!interviewer.is_terminated());
    asha.teardown();
    interviewer.teardown();
}

#[tokio::test]
async fn dropped_handles_leave_the_roster() {
    let store = RealtimeStore::new();
    let mut interviewer = join(&store, "482913", "Interviewer", Role::Interviewer);
    let asha = join(&store, "482913", "Asha", Role::Candidate);
    wait_for(&mut interviewer, |e| matches!(e, SessionEvent::Joined(_))).await;

    // No explicit leave: the connection going away removes the presence record.
    drop(asha);
    let left = wait_for(&mut interviewer, |e| matches!(e, SessionEvent::Left(_))).await;
    assert!(matches!(left, SessionEvent::Left(p) if p.name == "Asha"));
    let roster = wait_for(&mut interviewer, |e| matches!(e, SessionEvent::Roster { .. })).await;
    assert!(matches!(roster, SessionEvent::Roster { label, .. } if label == "1 user online"));
    interviewer.teardown();
}

#[tokio::test]
async fn rosters_converge_for_every_joiner() {
    let store = RealtimeStore::new();
    let mut handles = vec![join(&store, "ROSTER1", "Interviewer", Role::Interviewer)];
    for name in ["Asha", "Ben", "Chen"] {
        handles.push(join(&store, "ROSTER1", name, Role::Candidate));
    }
    for handle in handles.iter_mut() {
        while handle.roster().len() < 4 {
            wait_for(handle, |e| matches!(e, SessionEvent::Roster { .. })).await;
        }
    }
    let first = handles[0].roster();
    for handle in &handles {
        assert_eq!(handle.roster(), first);
    }
    for mut handle in handles {
        handle.teardown();
    }
}

#[tokio::test]
async fn settings_changes_are_not_echoed_to_the_writer() {
    let store = RealtimeStore::new();
    let mut interviewer = join(&store, "482913", "Interviewer", Role::Interviewer);
    let mut asha = join(&store, "482913", "Asha", Role::Candidate);
    wait_for(&mut interviewer, |e| matches!(e, SessionEvent::Roster { .. })).await;

    interviewer.set_language("python").unwrap();
    let event = wait_for(&mut asha, |e| matches!(e, SessionEvent::SettingsChanged(_))).await;
    let expected = Settings { language: Some("python".into()), theme: None };
    assert_eq!(event, SessionEvent::SettingsChanged(expected.clone()));
    assert_eq!(asha.settings(), &expected);
    assert!(quiet(&mut interviewer).await);

    // Setting the value already in place writes nothing.
    asha.set_language("python").unwrap();
    assert!(quiet(&mut interviewer).await);

    asha.teardown();
    interviewer.teardown();
}
