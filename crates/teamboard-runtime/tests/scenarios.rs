//! End-to-end controller scenarios.
//!
//! Each test drives a [`Dashboard`] tick by tick against a scripted source
//! and checks both the controller's report and the final screen image.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use teamboard_enrich::{CacheEntry, EnrichmentKey, EntityKey, LookupError};
use teamboard_render::ScreenModel;
use teamboard_runtime::{
    DETAIL, Dashboard, DashboardConfig, Dispatch, Dispatcher, Entity, EntityPoll, EntitySource,
    HISTORY, KeyCode, KeyEvent, Keymap, Modifiers, Phase, RosterView, SessionInfo,
};

const WAIT: Duration = Duration::from_secs(5);

struct World {
    poll: EntityPoll,
    picks: HashMap<String, String>,
}

#[derive(Clone)]
struct SharedSource(Arc<Mutex<World>>);

impl SharedSource {
    fn new(poll: EntityPoll) -> Self {
        Self(Arc::new(Mutex::new(World {
            poll,
            picks: HashMap::new(),
        })))
    }

    fn set_poll(&self, poll: EntityPoll) {
        self.0.lock().unwrap().poll = poll;
    }

    fn pick(&self, entity: &str, pick: &str) {
        self.0
            .lock()
            .unwrap()
            .picks
            .insert(entity.to_owned(), pick.to_owned());
    }
}

impl EntitySource for SharedSource {
    fn fetch_entities(&mut self) -> EntityPoll {
        self.0.lock().unwrap().poll.clone()
    }

    fn fetch_selector(&mut self, key: &EntityKey) -> Option<String> {
        self.0.lock().unwrap().picks.get(key.as_str()).cloned()
    }
}

fn players(ids: &[&str]) -> EntityPoll {
    EntityPoll::Session(SessionInfo {
        title: Some("RANKED SOLO".into()),
        entities: ids.iter().map(|id| Entity::new(*id, *id)).collect(),
        separator: None,
    })
}

fn screen(dash: &Dashboard<SharedSource, RosterView, Vec<u8>>) -> Vec<String> {
    let mut model = ScreenModel::new();
    model.process(dash.log().writer());
    model.visible_text()
}

fn history_lookup(key: &EnrichmentKey) -> Result<String, LookupError> {
    Ok(if key.subject.as_str() == "P1" { "WWL" } else { "LLW" }.to_owned())
}

fn detail_key(pick: &str, focus: Option<&str>) -> EnrichmentKey {
    EnrichmentKey::new(pick, DETAIL).with_selector(focus)
}

#[test]
fn scenario_a_claimed_value_appears_without_reclaim() {
    let source = SharedSource::new(players(&["P1", "P2"]));
    source.pick("P1", "S1");
    let mut dash = Dashboard::new(source, RosterView, Vec::new(), DashboardConfig::default())
        .unwrap();
    dash.register(HISTORY, history_lookup);
    dash.register(
        DETAIL,
        |key: &EnrichmentKey| -> Result<String, LookupError> {
            match key.subject.as_str() {
                "S1" => Ok("Value1".to_owned()),
                _ => Err(LookupError::NoData),
            }
        },
    );

    let first = dash.tick().unwrap();
    assert_eq!(first.phase, Phase::ActiveDisplay);
    assert!(first.claims.contains(&detail_key("S1", None)));
    assert_eq!(first.claims.len(), 3);

    assert!(dash.pool().wait_idle(WAIT));
    let second = dash.tick().unwrap();
    assert!(second.redrawn);
    assert!(second.claims.is_empty());
    assert_eq!(second.completed, 3);
    assert_eq!(
        dash.cache().get(&detail_key("S1", None)),
        CacheEntry::Ready("Value1".into())
    );

    let text = screen(&dash);
    let p1 = text.iter().position(|l| l.contains("P1")).unwrap();
    assert!(text[p1 + 1].contains("Value1"));
    assert!(text[p1 + 1].starts_with("│ •••"));

    let third = dash.tick().unwrap();
    assert!(third.claims.is_empty());
    assert!(!third.redrawn);
}

#[test]
fn scenario_b_session_end_erases_exactly_the_table() {
    let source = SharedSource::new(EntityPoll::Waiting);
    let mut dash = Dashboard::new(
        source.clone(),
        RosterView,
        Vec::new(),
        DashboardConfig::default().waiting_banner(None::<String>),
    )
    .unwrap();
    dash.register(HISTORY, history_lookup);

    assert_eq!(dash.tick().unwrap().phase, Phase::AwaitingSession);
    assert_eq!(dash.log().size(), 0);

    source.set_poll(players(&["P1", "P2"]));
    dash.tick().unwrap();
    assert!(dash.pool().wait_idle(WAIT));
    dash.tick().unwrap();

    let anchor = dash.anchor().unwrap();
    let table_lines = dash.log().size() - anchor;
    // Two rows of two lines between the borders.
    assert_eq!(table_lines, 2 * 2 + 2);

    source.set_poll(players(&[]));
    let report = dash.tick().unwrap();
    assert_eq!(report.phase, Phase::Ended);
    assert_eq!(dash.log().size(), anchor);
    let tail = format!("\x1b[{table_lines}A\r\x1b[J");
    assert!(dash.log().writer().ends_with(tail.as_bytes()));
    assert!(screen(&dash).is_empty());

    // Polling stops: further ticks write nothing.
    let written = dash.log().writer().len();
    source.set_poll(players(&["P3"]));
    assert_eq!(dash.tick().unwrap().phase, Phase::Ended);
    assert_eq!(dash.log().writer().len(), written);
}

#[test]
fn scenario_c_focus_change_claims_new_key_once() {
    let source = SharedSource::new(players(&["P1", "P2"]));
    source.pick("P1", "Ahri");

    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let mut dash = Dashboard::new(
        source,
        RosterView,
        Vec::new(),
        DashboardConfig::default()
            .focus_labels(["S1", "S2"])
            .initial_focus(Some("S1")),
    )
    .unwrap();
    dash.register(HISTORY, history_lookup);
    dash.register(
        DETAIL,
        move |key: &EnrichmentKey| -> Result<String, LookupError> {
            if key.selector.as_deref() == Some("S2") {
                release_rx.lock().unwrap().recv_timeout(WAIT).ok();
            }
            Ok(format!("detail {}", key.selector.as_deref().unwrap_or("")))
        },
    );

    dash.tick().unwrap();
    assert!(dash.pool().wait_idle(WAIT));
    dash.tick().unwrap();
    let s1 = detail_key("Ahri", Some("S1"));
    assert_eq!(dash.cache().get(&s1), CacheEntry::Ready("detail S1".into()));

    dash.handle().set_focus(Some("S2"));
    let report = dash.tick().unwrap();
    assert_eq!(report.claims, vec![detail_key("Ahri", Some("S2"))]);
    assert!(report.redrawn);
    assert_eq!(
        dash.cache().get(&detail_key("Ahri", Some("S2"))),
        CacheEntry::Pending
    );
    let text = screen(&dash);
    let p1 = text.iter().position(|l| l.contains("P1")).unwrap();
    assert!(text[p1 + 1].contains('…'));
    assert_eq!(dash.cache().get(&s1), CacheEntry::Ready("detail S1".into()));

    let again = dash.tick().unwrap();
    assert!(again.claims.is_empty());

    release_tx.send(()).unwrap();
    assert!(dash.pool().wait_idle(WAIT));
    dash.tick().unwrap();
    let text = screen(&dash);
    let p1 = text.iter().position(|l| l.contains("P1")).unwrap();
    assert!(text[p1 + 1].contains("detail S2"));
}

#[test]
fn redraws_stay_in_place() {
    let source = SharedSource::new(players(&["P1", "P2"]));
    let mut dash =
        Dashboard::new(source.clone(), RosterView, Vec::new(), DashboardConfig::default())
            .unwrap();
    dash.register(HISTORY, history_lookup);

    dash.tick().unwrap();
    let rows_before = screen(&dash).len();
    for pick in ["Ahri", "Lux", "Zed"] {
        source.pick("P2", pick);
        assert!(dash.tick().unwrap().redrawn);
    }
    let text = screen(&dash);
    assert_eq!(text.len(), rows_before);
    assert!(text.iter().any(|l| l.contains("Zed")));
    assert!(!text.iter().any(|l| l.contains("Lux")));
}

#[test]
fn keys_reach_the_controller_through_the_dispatcher() {
    let source = SharedSource::new(players(&["P1"]));
    let mut dash = Dashboard::new(
        source,
        RosterView,
        Vec::new(),
        DashboardConfig::default().focus_labels(["top", "mid"]),
    )
    .unwrap();
    let labels = ["top", "mid"];
    let dispatcher = Dispatcher::new(Keymap::with_defaults().buttons(labels), dash.handle());

    assert_eq!(dispatcher.dispatch(&KeyEvent::ctrl_shift('M')), Dispatch::Handled);
    assert_eq!(dispatcher.dispatch(&KeyEvent::char('x')), Dispatch::Ignored);
    dash.tick().unwrap();
    assert_eq!(dash.focus(), Some("mid"));
    assert!(screen(&dash).last().unwrap().contains("top  mid"));

    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), Modifiers::CTRL);
    assert_eq!(dispatcher.dispatch(&ctrl_c), Dispatch::Quit);
    assert_eq!(dash.tick().unwrap().phase, Phase::Ended);
    assert!(screen(&dash).is_empty());
}

#[test]
fn run_returns_when_quit_from_another_thread() {
    let source = SharedSource::new(EntityPoll::Waiting);
    let mut dash = Dashboard::new(
        source,
        RosterView,
        Vec::new(),
        DashboardConfig::default().await_interval(Duration::from_secs(30)),
    )
    .unwrap();
    let handle = dash.handle();
    let quitter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        handle.quit();
    });

    dash.run().unwrap();
    quitter.join().unwrap();
    assert_eq!(dash.phase(), Phase::Ended);
    assert_eq!(dash.log().size(), 0);
}

#[test]
fn session_ended_while_waiting_stops() {
    let source = SharedSource::new(EntityPoll::Ended);
    let mut dash =
        Dashboard::new(source, RosterView, Vec::new(), DashboardConfig::default()).unwrap();
    dash.run().unwrap();
    assert_eq!(dash.phase(), Phase::Ended);
    assert!(dash.log().writer().is_empty());
}
