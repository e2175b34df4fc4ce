//! Integration tests for a full huddle run.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::tempdir;

use huddle_chat::mock::ScriptedBackend;
use huddle_chat::{
    AgentGroupChat, MessageCountTermination, PersonaLoader, Transcript, TranscriptStore,
};
use huddle_core::{
    ApprovalDecision, ApprovalPrompt, BrowserLauncher, GateOutcome, HuddleConfig, PublishReport,
    Publisher, ScriptPublisher, TurnStop, Workflow, WorkflowContext, WorkflowResult,
};

struct Answer(ApprovalDecision);

#[async_trait]
impl ApprovalPrompt for Answer {
    async fn ask(&mut self) -> ApprovalDecision {
        self.0
    }
}

struct NoBrowser;

impl BrowserLauncher for NoBrowser {
    fn open(&self, _path: &Path) -> WorkflowResult<()> {
        Ok(())
    }
}

struct Pushed;

impl Publisher for Pushed {
    fn publish(&self) -> WorkflowResult<PublishReport> {
        Ok(PublishReport {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
        })
    }
}

fn write_skills(root: &Path) {
    for (dir, text) in [
        ("BA", "You are the Business Analyst."),
        ("SE", "You are the Software Engineer. Reply with ```html blocks."),
        ("PO", "You are the Product Owner. Say READY FOR USER APPROVAL when done."),
    ] {
        let dir = root.join("skills").join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("system_message.txt"), text).unwrap();
    }
}

fn build_context(root: &Path, backend: ScriptedBackend, answer: ApprovalDecision) -> WorkflowContext {
    write_skills(root);
    let config = HuddleConfig::load(root).unwrap();
    let personas = PersonaLoader::new(config.skills_path()).load_all().unwrap();
    let transcript = Transcript::start(TranscriptStore::new(root)).unwrap();
    let chat = AgentGroupChat::new(personas, Arc::new(backend))
        .unwrap()
        .with_termination(MessageCountTermination::new(config.max_turns))
        .with_transcript(transcript);

    WorkflowContext::new(config, chat)
        .with_prompt(Answer(answer))
        .with_browser(NoBrowser)
}

/// Turn loop never exceeds the configured cap even with an endless chat.
#[tokio::test]
async fn test_turn_cap_with_long_conversation() {
    let temp = tempdir().unwrap();
    let backend = ScriptedBackend::new();
    let mut ctx = build_context(temp.path(), backend.clone(), ApprovalDecision::Cancel);

    let report = Workflow::run(&mut ctx, "Build a stopwatch").await.unwrap();

    assert!(report.turns.produced <= 15);
    assert!(report.messages.len() <= 16);
    assert!(backend.call_count() <= 15);
    assert_eq!(report.approval, GateOutcome::NotRequested);
}

/// Personas see their own instructions loaded from the skills directory.
#[tokio::test]
async fn test_personas_receive_instructions_from_disk() {
    let temp = tempdir().unwrap();
    let backend = ScriptedBackend::new().reply("q").reply("a").reply("ok");
    let mut ctx = build_context(temp.path(), backend.clone(), ApprovalDecision::Cancel);
    ctx.config.max_turns = 3;

    Workflow::run(&mut ctx, "Build a stopwatch").await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].persona, "SoftwareEngineer");
    assert!(calls[1].instructions.contains("```html"));
    assert!(calls[2].instructions.contains("READY FOR USER APPROVAL"));
}

/// A failing publish script is surfaced and the run still extracts HTML.
#[cfg(unix)]
#[tokio::test]
async fn test_failing_publish_script_is_reported() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempdir().unwrap();
    let script = temp.path().join("push_to_github.sh");
    fs::write(&script, "#!/bin/sh\necho 'remote rejected' >&2\nexit 3\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let backend = ScriptedBackend::new()
        .reply("Just a counter.")
        .reply("```html\n<!DOCTYPE html>\n<html><body>0</body></html>\n```")
        .reply("READY FOR USER APPROVAL");
    let mut ctx = build_context(temp.path(), backend, ApprovalDecision::Approved);
    ctx.config.max_turns = 3;

    let report = Workflow::run(&mut ctx, "Build a counter").await.unwrap();

    let publish = report.publish.as_ref().expect("publish hook ran");
    assert_eq!(publish.exit_code, Some(3));
    assert!(publish.stderr.contains("remote rejected"));
    assert!(!report.published());

    let html = fs::read_to_string(temp.path().join("index.html")).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
}

/// The publish script runs after the artifact is written, so it pushes
/// the current page.
#[cfg(unix)]
#[tokio::test]
async fn test_publish_script_sees_written_artifact() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempdir().unwrap();
    let script = temp.path().join("push_to_github.sh");
    fs::write(
        &script,
        "#!/bin/sh\nif [ -f index.html ]; then echo PRESENT; else echo MISSING; fi\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let backend = ScriptedBackend::new()
        .reply("A counter with one button.")
        .reply("```html\n<!DOCTYPE html>\n<html><body>1</body></html>\n```")
        .reply("READY FOR USER APPROVAL");
    let mut ctx = build_context(temp.path(), backend, ApprovalDecision::Approved);
    ctx.config.max_turns = 3;

    let report = Workflow::run(&mut ctx, "Build a counter").await.unwrap();

    let publish = report.publish.as_ref().expect("publish hook ran");
    assert!(report.published());
    assert_eq!(publish.stdout.trim(), "PRESENT");
}

/// A prompt that mentions approval does not cut the conversation short.
#[tokio::test]
async fn test_prompt_mentioning_approval_runs_all_turns() {
    let temp = tempdir().unwrap();
    let backend = ScriptedBackend::new()
        .reply("Which vendors count as approved?")
        .reply("```html\n<ul><li>Acme</li></ul>\n```")
        .reply("Looks complete.");
    let mut ctx = build_context(temp.path(), backend.clone(), ApprovalDecision::Cancel)
        .with_publisher(Pushed);
    ctx.config.max_turns = 3;

    let report = Workflow::run(&mut ctx, "Build a page listing our approved vendors")
        .await
        .unwrap();

    assert_eq!(report.turns.produced, 3);
    assert_eq!(report.turns.stop, TurnStop::CapReached);
    assert_eq!(backend.call_count(), 3);
    assert!(report.artifact.is_some());
    assert_eq!(
        fs::read_to_string(temp.path().join("index.html")).unwrap(),
        "<ul><li>Acme</li></ul>"
    );
}

/// The direct publisher reports a successful script's stdout.
#[cfg(unix)]
#[test]
fn test_script_publisher_success() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempdir().unwrap();
    let script = temp.path().join("push.sh");
    fs::write(&script, "#!/bin/sh\necho pushed\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let report = ScriptPublisher::new(&script, temp.path()).publish().unwrap();
    assert!(report.success());
    assert_eq!(report.stdout.trim(), "pushed");
}

/// Every message of the run, including the injected approval, lands in
/// the transcript in order.
#[tokio::test]
async fn test_transcript_records_the_run() {
    let temp = tempdir().unwrap();
    let backend = ScriptedBackend::new()
        .reply("Scope agreed.")
        .reply("```html\n<p>v1</p>\n```")
        .reply("READY FOR USER APPROVAL");
    let mut ctx = build_context(temp.path(), backend, ApprovalDecision::Skip);
    ctx.config.max_turns = 3;

    let report = Workflow::run(&mut ctx, "Build v1").await.unwrap();
    assert_eq!(report.turns.stop, TurnStop::CapReached);

    let session = ctx.chat.transcript().unwrap().session_id().to_string();
    let stored = TranscriptStore::new(temp.path()).load_messages(&session).unwrap();
    assert_eq!(stored, report.messages);
    assert_eq!(stored[0].content, "Build v1");
}
