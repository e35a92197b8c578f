//! End-to-end command flows driven through the dispatcher over real
//! channels, without a network socket.

use std::sync::Arc;

use backend_lib::config::{RoomSettings, ServerSettings, Settings};
use backend_lib::dispatcher::Dispatcher;
use backend_lib::messages::{
    chair_assumed_topic, destroyed_topic, error_topic, state_topic, ClientFrame, ServerEvent,
    ServerFrame, TimerAction, SESSION_ERROR_TOPIC,
};
use backend_lib::room::State;
use backend_lib::topics::OUTBOUND_BUFFER;
use backend_lib::AppState;
use tokio::sync::mpsc;

fn app_state(max_rooms: usize) -> Arc<AppState> {
    Arc::new(AppState::new(Settings {
        server: ServerSettings::default(),
        room: RoomSettings { max_rooms },
    }))
}

/// A fake connection: a dispatcher plus the receiving end of its channel.
struct TestClient {
    dispatcher: Dispatcher,
    rx: mpsc::Receiver<ServerFrame>,
}

impl TestClient {
    fn connect(state: &Arc<AppState>) -> Self {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let dispatcher = Dispatcher::new(state.clone());
        state.bus.register_session(dispatcher.session_id(), tx);
        Self { dispatcher, rx }
    }

    fn send(&self, frame: ClientFrame) {
        self.dispatcher.handle_frame(frame);
    }

    /// Subscribe to every topic of a room, the way the front-end does on
    /// page load.
    fn watch_room(&self, code: &str) {
        for topic in [
            state_topic(code),
            chair_assumed_topic(code),
            destroyed_topic(code),
            error_topic(code),
        ] {
            self.send(ClientFrame::Subscribe { topic });
        }
    }

    fn recv(&mut self) -> ServerFrame {
        self.rx.try_recv().expect("expected a frame")
    }

    fn recv_state(&mut self) -> State {
        let frame = self.recv();
        match frame.body {
            ServerEvent::State(state) => state,
            other => panic!("expected a state frame, got {other:?}"),
        }
    }

    /// Drop everything already queued.
    fn drain(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }

    fn assert_silent(&mut self) {
        assert!(self.rx.try_recv().is_err(), "expected no pending frames");
    }

    fn queue_names(state: &State) -> Vec<&str> {
        state.queue.iter().map(|p| p.name.as_str()).collect()
    }
}

fn join(client: &TestClient, code: &str, name: &str) {
    client.send(ClientFrame::Join {
        room: code.to_string(),
        name: name.to_string(),
    });
}

fn request(client: &TestClient, code: &str, name: &str) {
    client.send(ClientFrame::Request {
        room: code.to_string(),
        name: name.to_string(),
    });
}

fn vote(client: &TestClient, code: &str, key: &str) {
    client.send(ClientFrame::PollVote {
        room: code.to_string(),
        vote: key.to_string(),
    });
}

/// S1: queue up, then walk the queue with `next`.
#[test]
fn queue_then_next_walks_speakers_in_order() {
    let state = app_state(10);
    state.registry.create("ABCD");

    let mut chair = TestClient::connect(&state);
    chair.watch_room("ABCD");
    join(&chair, "ABCD", "Chair");
    let snapshot = chair.recv_state();
    assert!(snapshot.chair_occupied);

    request(&chair, "ABCD", "Alice");
    let snapshot = chair.recv_state();
    assert_eq!(TestClient::queue_names(&snapshot), vec!["Alice"]);

    request(&chair, "ABCD", "Bob");
    let snapshot = chair.recv_state();
    assert_eq!(TestClient::queue_names(&snapshot), vec!["Alice", "Bob"]);

    chair.send(ClientFrame::Next {
        room: "ABCD".to_string(),
    });
    let snapshot = chair.recv_state();
    assert_eq!(snapshot.current.as_ref().unwrap().participant.name, "Alice");
    assert_eq!(TestClient::queue_names(&snapshot), vec!["Bob"]);

    chair.send(ClientFrame::Next {
        room: "ABCD".to_string(),
    });
    let snapshot = chair.recv_state();
    assert_eq!(snapshot.current.as_ref().unwrap().participant.name, "Bob");
    assert!(snapshot.queue.is_empty());

    chair.send(ClientFrame::Next {
        room: "ABCD".to_string(),
    });
    let snapshot = chair.recv_state();
    assert!(snapshot.current.is_none());
    assert!(snapshot.queue.is_empty());
}

/// S2: case-insensitive queue deduplication keeps the original entry.
#[test]
fn duplicate_names_are_ignored_case_insensitively() {
    let state = app_state(10);
    state.registry.create("ABCD");

    let mut client = TestClient::connect(&state);
    client.watch_room("ABCD");
    request(&client, "ABCD", "alice");
    client.recv_state();
    request(&client, "ABCD", "ALICE");
    let snapshot = client.recv_state();
    assert_eq!(TestClient::queue_names(&snapshot), vec!["alice"]);
}

/// S3: chair role is lost on disconnect and can then be assumed by another
/// session.
#[test]
fn chair_is_released_on_disconnect_and_reassumable() {
    let state = app_state(10);
    state.registry.create("ABCD");

    let mut s1 = TestClient::connect(&state);
    s1.watch_room("ABCD");
    join(&s1, "ABCD", "Chair");
    assert!(s1.recv_state().chair_occupied);

    let mut s2 = TestClient::connect(&state);
    s2.watch_room("ABCD");
    s2.send(ClientFrame::AssumeChair {
        room: "ABCD".to_string(),
        participant_name: "Maya".to_string(),
        request_id: "req-1".to_string(),
    });
    // Occupied: state rebroadcast plus a failed reply.
    let snapshot = s2.recv_state();
    assert!(snapshot.chair_occupied);
    let frame = s2.recv();
    let ServerEvent::ChairAssumed(reply) = frame.body else {
        panic!("expected a chairAssumed reply");
    };
    assert!(!reply.success);
    assert_eq!(reply.request_id, "req-1");

    s1.dispatcher.on_disconnect();
    s2.drain();
    // The release broadcast reaches remaining subscribers... of which s2 is
    // one; trigger a fresh read via its own assume.
    s2.send(ClientFrame::AssumeChair {
        room: "ABCD".to_string(),
        participant_name: "Maya".to_string(),
        request_id: "req-2".to_string(),
    });
    let snapshot = s2.recv_state();
    assert!(snapshot.chair_occupied);
    let frame = s2.recv();
    let ServerEvent::ChairAssumed(reply) = frame.body else {
        panic!("expected a chairAssumed reply");
    };
    assert!(reply.success);
    assert_eq!(reply.request_id, "req-2");
}

/// The chair release itself is broadcast to surviving subscribers.
#[test]
fn disconnect_broadcasts_the_released_chair() {
    let state = app_state(10);
    state.registry.create("ABCD");

    let chair = TestClient::connect(&state);
    join(&chair, "ABCD", "Chair");

    let mut watcher = TestClient::connect(&state);
    watcher.watch_room("ABCD");

    chair.dispatcher.on_disconnect();
    let snapshot = watcher.recv_state();
    assert!(!snapshot.chair_occupied);
}

/// S4: full yes/no poll lifecycle with results surviving `close`.
#[test]
fn poll_lifecycle_end_to_end() {
    let state = app_state(10);
    state.registry.create("ABCD");

    let mut chair = TestClient::connect(&state);
    chair.watch_room("ABCD");
    join(&chair, "ABCD", "Chair");

    chair.send(ClientFrame::PollStart {
        room: "ABCD".to_string(),
        question: "Proceed?".to_string(),
        poll_type: "YES_NO".to_string(),
        options: None,
        votes_per_participant: None,
    });

    let voters: Vec<TestClient> = (0..4).map(|_| TestClient::connect(&state)).collect();
    for voter in voters.iter().take(3) {
        vote(voter, "ABCD", "YES");
    }
    vote(&voters[3], "ABCD", "NO");

    chair.send(ClientFrame::PollEnd {
        room: "ABCD".to_string(),
    });
    chair.drain();
    chair.send(ClientFrame::PollClose {
        room: "ABCD".to_string(),
    });
    let snapshot = chair.recv_state();
    let poll = snapshot.poll_state.unwrap();
    assert_eq!(poll.status.as_deref(), Some("CLOSED"));
    assert!(poll.question.is_none());
    let last = poll.last_results.unwrap();
    assert_eq!(last.question, "Proceed?");
    assert_eq!(last.results["YES"], 3);
    assert_eq!(last.results["NO"], 1);
    assert_eq!(last.total_votes, 4);

    // A new poll keeps the previous results until it ends itself.
    chair.send(ClientFrame::PollStart {
        room: "ABCD".to_string(),
        question: "Adjourn?".to_string(),
        poll_type: "YES_NO".to_string(),
        options: None,
        votes_per_participant: None,
    });
    let snapshot = chair.recv_state();
    let poll = snapshot.poll_state.unwrap();
    assert_eq!(poll.question.as_deref(), Some("Adjourn?"));
    assert_eq!(poll.last_results.unwrap().question, "Proceed?");

    chair.send(ClientFrame::PollEnd {
        room: "ABCD".to_string(),
    });
    let snapshot = chair.recv_state();
    let poll = snapshot.poll_state.unwrap();
    assert_eq!(poll.last_results.unwrap().question, "Adjourn?");
}

/// S5: changing a vote moves the tally.
#[test]
fn vote_change_in_a_yes_no_poll() {
    let state = app_state(10);
    state.registry.create("ABCD");

    let mut chair = TestClient::connect(&state);
    chair.watch_room("ABCD");
    join(&chair, "ABCD", "Chair");
    chair.send(ClientFrame::PollStart {
        room: "ABCD".to_string(),
        question: "Proceed?".to_string(),
        poll_type: "YES_NO".to_string(),
        options: None,
        votes_per_participant: None,
    });
    chair.drain();

    let x = TestClient::connect(&state);
    vote(&x, "ABCD", "YES");
    vote(&x, "ABCD", "NO");

    let snapshot = chair.recv_state(); // after YES
    let poll = snapshot.poll_state.unwrap();
    assert_eq!(poll.results["YES"], 1);
    let snapshot = chair.recv_state(); // after NO
    let poll = snapshot.poll_state.unwrap();
    assert_eq!(poll.results["YES"], 0);
    assert_eq!(poll.results["NO"], 1);
    assert_eq!(poll.total_votes, 1);
}

/// S6: multiple-selection cap with toggling.
#[test]
fn multiselect_multiple_enforces_the_cap() {
    let state = app_state(10);
    state.registry.create("ABCD");

    let mut chair = TestClient::connect(&state);
    chair.watch_room("ABCD");
    join(&chair, "ABCD", "Chair");
    chair.send(ClientFrame::PollStart {
        room: "ABCD".to_string(),
        question: "Pick two".to_string(),
        poll_type: "MULTISELECT_MULTIPLE".to_string(),
        options: Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
        votes_per_participant: Some(2),
    });
    chair.drain();

    let x = TestClient::connect(&state);
    vote(&x, "ABCD", "OPT_0");
    vote(&x, "ABCD", "OPT_1");
    vote(&x, "ABCD", "OPT_2"); // over the cap: rejected, no broadcast
    vote(&x, "ABCD", "OPT_0"); // toggle off
    vote(&x, "ABCD", "OPT_2"); // now accepted

    let mut last = None;
    while let Ok(frame) = chair.rx.try_recv() {
        if let ServerEvent::State(state) = frame.body {
            last = Some(state);
        }
    }
    // Four accepted votes produced four snapshots; the rejected one none.
    let poll = last.unwrap().poll_state.unwrap();
    assert_eq!(poll.results["OPT_0"], 0);
    assert_eq!(poll.results["OPT_1"], 1);
    assert_eq!(poll.results["OPT_2"], 1);
    assert_eq!(poll.total_votes, 2);
    assert_eq!(poll.options.unwrap(), vec!["a", "b", "c"]);
}

/// S7: eviction at capacity invalidates sessions of the evicted room.
#[test]
fn eviction_surfaces_room_not_found_to_stale_sessions() {
    let state = app_state(2);
    state.registry.create("R1AA");

    let mut stale = TestClient::connect(&state);
    stale.watch_room("R1AA");
    join(&stale, "R1AA", "Ann");
    stale.drain();

    state.registry.create("R2AA");
    state.registry.create("R3AA");
    assert!(state.registry.find("R1AA").is_none());
    assert!(state.registry.find("R2AA").is_some());
    assert!(state.registry.find("R3AA").is_some());

    request(&stale, "R1AA", "Ann");
    let frame = stale.recv();
    assert_eq!(frame.topic, error_topic("R1AA"));
    let ServerEvent::Error(err) = frame.body else {
        panic!("expected an error frame");
    };
    assert_eq!(err.action, "room_not_found");
    assert_eq!(err.room_code, "R1AA");
}

/// S8: chair-driven destroy notifies subscribers and unmaps the room.
#[test]
fn destroy_notifies_and_forgets_the_room() {
    let state = app_state(10);
    state.registry.create("ABCD");

    let mut chair = TestClient::connect(&state);
    chair.watch_room("ABCD");
    join(&chair, "ABCD", "Chair");
    chair.drain();

    let mut participant = TestClient::connect(&state);
    participant.watch_room("ABCD");
    join(&participant, "ABCD", "Pat");
    chair.drain();
    participant.drain();

    chair.send(ClientFrame::Destroy {
        room: "ABCD".to_string(),
    });

    for client in [&mut chair, &mut participant] {
        let frame = client.recv();
        assert_eq!(frame.topic, destroyed_topic("ABCD"));
        let ServerEvent::Destroyed(notice) = frame.body else {
            panic!("expected a destroyed notice");
        };
        assert_eq!(notice.message, "The room has been closed by the chair.");
        assert_eq!(notice.landing_url, "/landing.html");
    }

    assert!(state.registry.find("ABCD").is_none());
    assert!(state.registry.sessions_of("ABCD").is_empty());

    request(&participant, "ABCD", "Pat");
    let frame = participant.recv();
    let ServerEvent::Error(err) = frame.body else {
        panic!("expected an error frame");
    };
    assert_eq!(err.action, "room_not_found");
}

#[test]
fn destroy_by_non_chair_is_denied() {
    let state = app_state(10);
    state.registry.create("ABCD");
    let chair = TestClient::connect(&state);
    join(&chair, "ABCD", "Chair");

    let mut outsider = TestClient::connect(&state);
    outsider.watch_room("ABCD");
    outsider.send(ClientFrame::Destroy {
        room: "ABCD".to_string(),
    });
    let frame = outsider.recv();
    assert_eq!(frame.topic, SESSION_ERROR_TOPIC);
    let ServerEvent::Error(err) = frame.body else {
        panic!("expected an error frame");
    };
    assert_eq!(err.action, "chair_access_denied");
    assert!(state.registry.find("ABCD").is_some());
}

#[test]
fn chair_only_commands_from_participants_are_denied() {
    let state = app_state(10);
    state.registry.create("ABCD");
    let chair = TestClient::connect(&state);
    join(&chair, "ABCD", "Chair");

    let mut pat = TestClient::connect(&state);
    join(&pat, "ABCD", "Pat");
    pat.send(ClientFrame::Timer {
        room: "ABCD".to_string(),
        action: TimerAction::Start,
    });
    let frame = pat.recv();
    assert_eq!(frame.topic, SESSION_ERROR_TOPIC);
    let ServerEvent::Error(err) = frame.body else {
        panic!("expected an error frame");
    };
    assert_eq!(err.action, "chair_access_denied");
}

#[test]
fn commands_to_unknown_rooms_do_not_create_them() {
    let state = app_state(10);
    let mut client = TestClient::connect(&state);
    join(&client, "QQQQ", "Ann");
    let frame = client.recv();
    assert_eq!(frame.topic, error_topic("QQQQ"));
    let ServerEvent::Error(err) = frame.body else {
        panic!("expected an error frame");
    };
    assert_eq!(err.action, "room_not_found");
    assert!(state.registry.is_empty());
}

#[test]
fn invalid_payloads_yield_targeted_validation_errors() {
    let state = app_state(10);
    state.registry.create("ABCD");
    let mut client = TestClient::connect(&state);

    // Name outside the permitted class.
    join(&client, "ABCD", "<Chair>");
    let frame = client.recv();
    assert_eq!(frame.topic, SESSION_ERROR_TOPIC);
    let ServerEvent::Error(err) = frame.body else {
        panic!("expected an error frame");
    };
    assert_eq!(err.action, "validation_error");

    // Room code of the wrong length.
    request(&client, "ABCDE", "Ann");
    let frame = client.recv();
    let ServerEvent::Error(err) = frame.body else {
        panic!("expected an error frame");
    };
    assert_eq!(err.action, "validation_error");

    // Unknown poll type.
    client.send(ClientFrame::PollStart {
        room: "ABCD".to_string(),
        question: "Q?".to_string(),
        poll_type: "RANKED".to_string(),
        options: None,
        votes_per_participant: None,
    });
    let frame = client.recv();
    let ServerEvent::Error(err) = frame.body else {
        panic!("expected an error frame");
    };
    assert_eq!(err.action, "validation_error");
    client.assert_silent();
}

#[test]
fn room_codes_are_normalized_before_lookup() {
    let state = app_state(10);
    state.registry.create("ABOD");

    let mut client = TestClient::connect(&state);
    client.watch_room("ABOD");
    request(&client, "ab0d", "Ann");
    let snapshot = client.recv_state();
    assert_eq!(snapshot.room_code, "ABOD");
    assert_eq!(TestClient::queue_names(&snapshot), vec!["Ann"]);
}

#[test]
fn set_limit_is_clamped_and_applied() {
    let state = app_state(10);
    state.registry.create("ABCD");

    let mut chair = TestClient::connect(&state);
    chair.watch_room("ABCD");
    join(&chair, "ABCD", "Chair");
    chair.drain();

    chair.send(ClientFrame::SetLimit {
        room: "ABCD".to_string(),
        seconds: 7,
    });
    assert_eq!(chair.recv_state().default_limit_sec, 10);

    chair.send(ClientFrame::SetLimit {
        room: "ABCD".to_string(),
        seconds: 10_000,
    });
    assert_eq!(chair.recv_state().default_limit_sec, 3600);

    chair.send(ClientFrame::SetLimit {
        room: "ABCD".to_string(),
        seconds: 300,
    });
    assert_eq!(chair.recv_state().default_limit_sec, 300);
}

#[test]
fn update_config_parses_known_values_and_unsets_garbage() {
    let state = app_state(10);
    state.registry.create("ABCD");

    let mut chair = TestClient::connect(&state);
    chair.watch_room("ABCD");
    join(&chair, "ABCD", "Chair");
    chair.drain();

    chair.send(ClientFrame::UpdateConfig {
        room: "ABCD".to_string(),
        topic: Some("Quarterly budget".to_string()),
        meeting_goal: Some("MAKE_DECISIONS".to_string()),
        participation_format: Some("NOT_A_FORMAT".to_string()),
        decision_rule: Some("MAJORITY".to_string()),
        deliverable: Some(String::new()),
    });
    let config = chair.recv_state().room_config;
    assert_eq!(config.topic.as_deref(), Some("Quarterly budget"));
    assert!(config.meeting_goal.is_some());
    assert!(config.participation_format.is_none());
    assert!(config.decision_rule.is_some());
    assert!(config.deliverable.is_none());
}

/// Withdrawing leaves the current speaker alone (S1 family).
#[test]
fn withdraw_by_name_only_touches_the_queue() {
    let state = app_state(10);
    state.registry.create("ABCD");

    let mut chair = TestClient::connect(&state);
    chair.watch_room("ABCD");
    join(&chair, "ABCD", "Chair");
    request(&chair, "ABCD", "Alice");
    request(&chair, "ABCD", "Bob");
    chair.send(ClientFrame::Next {
        room: "ABCD".to_string(),
    });
    chair.drain();

    chair.send(ClientFrame::Withdraw {
        room: "ABCD".to_string(),
        name: "alice".to_string(),
    });
    let snapshot = chair.recv_state();
    assert_eq!(snapshot.current.clone().unwrap().participant.name, "Alice");
    assert_eq!(TestClient::queue_names(&snapshot), vec!["Bob"]);
}
