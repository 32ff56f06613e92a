use dsk::broker::{MessageBroker, TREE_SYNCED};
use dsk::error::BuildError;
use dsk::tree::{TreeBuilder, TreeHandle};
use dsk::types::hash_hex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::integration::support::{design_system, write};

const DIRS: [&str; 4] = ["", "01_Basics", "02_Components", "02_Components/Table"];

fn write_version(root: &Path, version: usize) {
    for dir in DIRS {
        let rel = if dir.is_empty() {
            "version.md".to_string()
        } else {
            format!("{}/version.md", dir)
        };
        write(root, &rel, &format!("v{}", version));
    }
}

fn open(root: &Path) -> TreeHandle {
    TreeHandle::open(TreeBuilder::new(root), Arc::new(MessageBroker::default())).unwrap()
}

#[test]
fn readers_never_observe_a_mix_of_snapshots() {
    let dir = design_system();
    write_version(dir.path(), 0);
    let handle = Arc::new(open(dir.path()));
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = Arc::clone(&handle);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut reads = 0;
                while !done.load(Ordering::Acquire) || reads == 0 {
                    // One "request": capture once, read slowly.
                    let tree = handle.current();
                    let mut seen = Vec::new();
                    for url in DIRS {
                        thread::sleep(Duration::from_millis(1));
                        let node = tree.get(url).unwrap().unwrap();
                        let doc = node
                            .docs()
                            .iter()
                            .find(|d| d.name() == "version.md")
                            .unwrap();
                        seen.push(doc.raw().to_vec());
                    }
                    assert!(seen.windows(2).all(|w| w[0] == w[1]), "mixed snapshot: {:?}", seen);
                    assert_eq!(tree.hash(), tree.root().hash());
                    reads += 1;
                }
            })
        })
        .collect();

    for version in 1..=10 {
        write_version(dir.path(), version);
        handle.rebuild().unwrap();
    }
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().unwrap();
    }

    let latest = handle.current();
    let doc = latest.root().docs().iter().find(|d| d.name() == "version.md").unwrap();
    assert_eq!(doc.raw(), b"v10");
}

#[test]
fn failed_rebuild_keeps_the_last_good_snapshot() {
    let dir = design_system();
    let handle = open(dir.path());
    let (_, mut inbox) = handle.broker().subscribe();
    let good_hash = *handle.current().hash();

    write(dir.path(), "01_Basics/index.yaml", "tags: [unclosed");
    let err = handle.rebuild().err().unwrap();
    assert!(matches!(err, BuildError::MetaYaml { .. }));

    let tree = handle.current();
    assert_eq!(*tree.hash(), good_hash);
    let basics = tree.get("01_Basics").unwrap().unwrap();
    assert_eq!(basics.description(), "Foundations");
    assert!(inbox.try_recv().is_err(), "failed rebuild must not notify");

    // Fixing the file recovers on the next rebuild.
    write(dir.path(), "01_Basics/index.yaml", "description: Fixed\n");
    let tree = handle.rebuild().unwrap();
    assert_ne!(*tree.hash(), good_hash);
    let msg = inbox.try_recv().unwrap();
    assert_eq!(msg.kind(), TREE_SYNCED);
    assert_eq!(msg.text(), hash_hex(tree.hash()));
}

#[test]
fn concurrent_rebuild_triggers_all_complete() {
    let dir = design_system();
    let handle = Arc::new(open(dir.path()));
    let (_, mut inbox) = handle.broker().subscribe();

    let triggers: Vec<_> = (0..4)
        .map(|_| {
            let handle = Arc::clone(&handle);
            thread::spawn(move || handle.rebuild().map(|t| *t.hash()))
        })
        .collect();
    let hashes: Vec<_> = triggers
        .into_iter()
        .map(|t| t.join().unwrap().unwrap())
        .collect();

    assert!(hashes.windows(2).all(|w| w[0] == w[1]));
    let mut notifications = 0;
    while inbox.try_recv().is_ok() {
        notifications += 1;
    }
    assert_eq!(notifications, 4);
}
