//! Log coverage for workflow environment changes.
//!
//! Runner-less invocations must tell the user which PATH entry to add by
//! hand, so the message is part of the observable behaviour.
#![expect(
    clippy::expect_used,
    reason = "tests fail fast when a workflow write errors"
)]

use camino::Utf8Path;
use common::workflow::{Environment, WorkflowEnvironment};
use log::Level;
use logtest::Logger;

#[test]
fn detached_add_path_logs_manual_instruction() {
    let mut logger = Logger::start();
    let environment = WorkflowEnvironment::detached();

    environment
        .add_path(Utf8Path::new("/opt/swift/usr/bin"))
        .expect("detached add_path succeeds");

    let mut saw_instruction = false;
    let mut saw_debug = false;
    while let Some(record) = logger.pop() {
        let message = record.args().to_owned();
        if record.level() == Level::Info && message.contains("add /opt/swift/usr/bin to PATH") {
            saw_instruction = true;
        }
        if record.level() == Level::Debug && message.contains("Added /opt/swift/usr/bin") {
            saw_debug = true;
        }
    }
    assert!(saw_instruction, "expected a manual PATH instruction");
    assert!(saw_debug, "expected a debug record for the PATH change");
}
