use dsk::broker::{Inbox, MessageBroker, TREE_SYNCED};
use dsk::config::WatchConfig;
use dsk::tree::{TreeBuilder, TreeHandle};
use dsk::types::hash_hex;
use dsk::watch::WatchDaemon;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::integration::support::{design_system, write};

fn fast_config() -> WatchConfig {
    WatchConfig {
        enabled: true,
        debounce_ms: 20,
        batch_window_ms: 100,
    }
}

fn wait_for_message(inbox: &mut Inbox, timeout: Duration) -> Option<String> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(msg) = inbox.try_recv() {
            assert_eq!(msg.kind(), TREE_SYNCED);
            return Some(msg.text().to_string());
        }
        thread::sleep(Duration::from_millis(20));
    }
    None
}

#[test]
fn file_change_triggers_rebuild_and_notification() {
    let dir = design_system();
    let handle = Arc::new(
        TreeHandle::open(TreeBuilder::new(dir.path()), Arc::new(MessageBroker::default())).unwrap(),
    );
    let before = *handle.current().hash();
    let (_, mut inbox) = handle.broker().subscribe();

    let daemon = Arc::new(WatchDaemon::new(Arc::clone(&handle), fast_config()));
    let runner = {
        let daemon = Arc::clone(&daemon);
        thread::spawn(move || daemon.run())
    };
    // Give the watcher time to register.
    thread::sleep(Duration::from_millis(300));

    write(dir.path(), "02_Components/Table/notes.md", "Sticky headers.");
    let text = wait_for_message(&mut inbox, Duration::from_secs(5));

    daemon.stop();
    runner.join().unwrap().unwrap();

    assert!(text.is_some(), "no tree-synced message within timeout");
    let tree = handle.current();
    assert_ne!(*tree.hash(), before);
    let table = tree.get("02_Components/Table").unwrap().unwrap();
    assert!(table.docs().iter().any(|d| d.name() == "notes.md"));
    // Later events may have produced more rebuilds; the latest one is live.
    let mut last = text.unwrap();
    while let Ok(msg) = inbox.try_recv() {
        last = msg.text().to_string();
    }
    assert_eq!(last, hash_hex(tree.hash()));
}

#[test]
fn changes_to_ignored_paths_do_not_rebuild() {
    let dir = design_system();
    let handle = Arc::new(
        TreeHandle::open(TreeBuilder::new(dir.path()), Arc::new(MessageBroker::default())).unwrap(),
    );
    let (_, mut inbox) = handle.broker().subscribe();

    let daemon = Arc::new(WatchDaemon::new(Arc::clone(&handle), fast_config()));
    let runner = {
        let daemon = Arc::clone(&daemon);
        thread::spawn(move || daemon.run())
    };
    thread::sleep(Duration::from_millis(300));

    write(dir.path(), "_drafts/Secret/readme.md", "still hidden");
    write(dir.path(), ".git/HEAD", "ref: refs/heads/main");
    let text = wait_for_message(&mut inbox, Duration::from_millis(800));

    daemon.stop();
    runner.join().unwrap().unwrap();
    assert!(text.is_none(), "ignored change rebuilt the tree");
}

#[test]
fn stop_before_run_returns_promptly() {
    let dir = design_system();
    let handle = Arc::new(
        TreeHandle::open(TreeBuilder::new(dir.path()), Arc::new(MessageBroker::default())).unwrap(),
    );
    let daemon = WatchDaemon::new(handle, fast_config());
    daemon.stopper().stop();
    daemon.run().unwrap();
}
