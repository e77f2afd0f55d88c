//! Unit tests for execution environments and body evaluation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mockall::mock;
use rstest::{fixture, rstest};

use super::*;
use crate::capability::{CommandSet, Component, PlatformCommand};
use crate::error::CommandError;
use crate::loader::Loader;

mock! {
    Command {}
    impl PlatformCommand for Command {
        fn invoke(&self, call: &Call, args: &[Value]) -> Result<Value, CommandError>;
    }
}

/// Records every command invocation as `name(arg, ...)`.
#[derive(Clone, Default)]
struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    fn command(&self, name: &'static str) -> impl PlatformCommand + 'static {
        let entries = Arc::clone(&self.entries);
        move |_call: &Call, args: &[Value]| -> Result<Value, CommandError> {
            let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
            entries
                .lock()
                .expect("journal lock")
                .push(format!("{name}({})", rendered.join(", ")));
            Ok(Value::Nil)
        }
    }

    fn entries(&self) -> Vec<String> {
        self.entries.lock().expect("journal lock").clone()
    }
}

struct Mailbox {
    owner: String,
    messages: i64,
}

impl Component for Mailbox {
    fn invoke(&mut self, method: &str, _args: &[Value]) -> Result<Value, CommandError> {
        match method {
            "owner" => Ok(Value::from(self.owner.clone())),
            "deposit" => {
                self.messages += 1;
                Ok(Value::Int(self.messages))
            }
            other => Err(CommandError::new(format!("mailbox has no method {other}"))),
        }
    }
}

fn components() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    registry
        .register("Voicemail", |call: &Arc<Call>, args: &[Value]| {
            let owner = args
                .first()
                .map_or_else(|| call.context().to_owned(), ToString::to_string);
            Ok(Box::new(Mailbox { owner, messages: 0 }) as Box<dyn Component>)
        })
        .expect("register voicemail");
    registry
}

struct Harness {
    journal: Journal,
    factory: EnvironmentFactory,
}

impl Harness {
    fn new(source: &str) -> Self {
        let journal = Journal::default();
        let commands = CommandSet::new()
            .with_command("answer", journal.command("answer"))
            .with_command("play", journal.command("play"))
            .with_command("hangup", journal.command("hangup"));
        let platforms = PlatformCommands::new().with_platform("asterisk", commands);
        let components = components();
        let contexts = Loader::new(&components).load(source).expect("dialplan loads");
        Self {
            journal,
            factory: EnvironmentFactory::new(
                Arc::new(platforms),
                Arc::new(components),
                Arc::new(contexts),
            ),
        }
    }

    fn environment(&self, call: Call) -> ExecutionEnvironment {
        self.factory.build(Arc::new(call)).expect("environment builds")
    }

    fn run(
        &self,
        env: &mut ExecutionEnvironment,
        name: &str,
    ) -> Result<BodyOutcome, ExecutionError> {
        let context = self.factory.contexts().get(name).cloned().expect("context exists");
        env.execute(&context, &CancellationToken::new())
    }
}

#[fixture]
fn call() -> Call {
    Call::new("default", "asterisk").with_variable("extension", "100")
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

#[rstest]
fn build_fails_for_unknown_platform() {
    let harness = Harness::new("default { }");
    let err = harness
        .factory
        .build(Arc::new(Call::new("default", "skype")))
        .expect_err("should fail");
    assert!(matches!(err, EnvironmentError::UnknownPlatform { .. }));
}

#[rstest]
fn environment_exposes_contexts_and_variables(call: Call) {
    let harness = Harness::new("default { }\nsales { }");
    let env = harness.environment(call);
    assert!(env.context("sales").is_some());
    assert!(env.context("billing").is_none());
    assert_eq!(env.variable("extension"), Value::from("100"));
    assert_eq!(env.variable("missing"), Value::Nil);
    assert!(env.current_context().is_none());
}

#[rstest]
fn failure_reason_reads_call_variable() {
    let harness = Harness::new("default { }");
    let env = harness.environment(
        Call::new("default", "asterisk").with_variable(FAILURE_REASON_VARIABLE, "congestion"),
    );
    assert_eq!(env.failure_reason().as_deref(), Some("congestion"));
}

// ---------------------------------------------------------------------------
// Capability invocation
// ---------------------------------------------------------------------------

#[rstest]
fn invoke_passes_call_and_arguments_to_command(call: Call) {
    let mut command = MockCommand::new();
    command
        .expect_invoke()
        .times(1)
        .returning(|received: &Call, args: &[Value]| {
            assert_eq!(received.context(), "default");
            assert_eq!(args, [Value::from("tt-monkeys")]);
            Ok(Value::from("played"))
        });
    let platforms = PlatformCommands::new()
        .with_platform("asterisk", CommandSet::new().with_command("play", command));
    let factory = EnvironmentFactory::new(
        Arc::new(platforms),
        Arc::new(ComponentRegistry::new()),
        Arc::new(ContextRegistry::new()),
    );
    let env = factory.build(Arc::new(call)).expect("environment builds");
    let result = env.invoke("play", &[Value::from("tt-monkeys")]);
    assert_eq!(result, Ok(Value::from("played")));
}

#[rstest]
fn command_failure_is_wrapped_with_its_name(call: Call) {
    let mut command = MockCommand::new();
    command
        .expect_invoke()
        .returning(|_call: &Call, _args: &[Value]| Err(CommandError::new("channel gone")));
    let platforms = PlatformCommands::new()
        .with_platform("asterisk", CommandSet::new().with_command("dial", command));
    let factory = EnvironmentFactory::new(
        Arc::new(platforms),
        Arc::new(ComponentRegistry::new()),
        Arc::new(ContextRegistry::new()),
    );
    let env = factory.build(Arc::new(call)).expect("environment builds");
    assert_eq!(
        env.invoke("dial", &[]),
        Err(ExecutionError::command("dial", CommandError::new("channel gone")))
    );
}

#[rstest]
fn variable_getter_rejects_arguments(call: Call) {
    let harness = Harness::new("default { }");
    let env = harness.environment(call);
    assert_eq!(env.invoke("extension", &[]), Ok(Value::from("100")));
    assert_eq!(
        env.invoke("extension", &[Value::Int(1)]),
        Err(ExecutionError::Arity {
            name: "extension".to_owned(),
            expected: 0,
            received: 1,
        })
    );
}

#[rstest]
fn unknown_capability_is_reported(call: Call) {
    let harness = Harness::new("default { }");
    let env = harness.environment(call);
    assert_eq!(
        env.invoke("record", &[]),
        Err(ExecutionError::unknown_capability("record"))
    );
}

// ---------------------------------------------------------------------------
// Body execution
// ---------------------------------------------------------------------------

#[rstest]
fn transfer_abandons_the_rest_of_the_body(call: Call) {
    let harness = Harness::new("default {\n answer\n +sales\n play(\"never\")\n}\nsales { }");
    let mut env = harness.environment(call);
    let outcome = harness.run(&mut env, "default").expect("body runs");
    let sales = harness.factory.contexts().get("sales").cloned().expect("sales");
    assert_eq!(outcome, BodyOutcome::TransferTo(sales));
    assert_eq!(harness.journal.entries(), vec!["answer()"]);
    assert_eq!(
        env.current_context().map(DialplanContext::name),
        Some("default")
    );
}

#[rstest]
fn return_completes_the_body_early(call: Call) {
    let harness = Harness::new("default {\n play(1)\n return\n play(2)\n}");
    let mut env = harness.environment(call);
    assert_eq!(harness.run(&mut env, "default"), Ok(BodyOutcome::Completed));
    assert_eq!(harness.journal.entries(), vec!["play(1)"]);
}

#[rstest]
#[case::first_branch("100", "play(sales)")]
#[case::second_branch("200", "play(support)")]
#[case::fallback("999", "play(operator)")]
fn conditionals_select_one_branch(#[case] extension: &str, #[case] expected: &str) {
    let source = "default {
        if $extension == \"100\" {
            play(\"sales\")
        } else if extension == \"200\" {
            play(\"support\")
        } else {
            play(\"operator\")
        }
    }";
    let harness = Harness::new(source);
    let call = Call::new("default", "asterisk").with_variable("extension", extension);
    let mut env = harness.environment(call);
    assert_eq!(harness.run(&mut env, "default"), Ok(BodyOutcome::Completed));
    assert_eq!(harness.journal.entries(), vec![expected]);
}

#[rstest]
fn locals_and_variable_writes(call: Call) {
    let harness = Harness::new(concat!(
        "default {\n let greeting = \"welcome\"\n play(greeting)\n",
        " $status = greeting\n $cleared = nil\n}",
    ));
    let mut env = harness.environment(call);
    assert_eq!(harness.run(&mut env, "default"), Ok(BodyOutcome::Completed));
    assert_eq!(harness.journal.entries(), vec!["play(welcome)"]);
    assert_eq!(env.variable("status"), Value::from("welcome"));
    assert_eq!(env.variable("cleared"), Value::from(""));
}

#[rstest]
fn locals_do_not_survive_between_runs(call: Call) {
    let harness = Harness::new("default {\n let seen = true\n}\nsales { play(seen) }");
    let mut env = harness.environment(call);
    assert_eq!(harness.run(&mut env, "default"), Ok(BodyOutcome::Completed));
    assert_eq!(
        harness.run(&mut env, "sales"),
        Err(ExecutionError::unknown_context("seen"))
    );
}

#[rstest]
fn components_are_reachable_by_class_and_constructor(call: Call) {
    let source = "default {
        let box = Voicemail.new(\"alice\")
        box.deposit()
        play(box.deposit())
        play(box.owner)
        let other = new_voicemail()
        play(other.owner())
    }";
    let harness = Harness::new(source);
    let mut env = harness.environment(call);
    assert_eq!(harness.run(&mut env, "default"), Ok(BodyOutcome::Completed));
    assert_eq!(
        harness.journal.entries(),
        vec!["play(2)", "play(alice)", "play(default)"]
    );
}

#[rstest]
#[case::unknown_name("default { +billing }", ExecutionError::unknown_context("billing"))]
#[case::unknown_call("default { record(\"x\") }", ExecutionError::unknown_capability("record"))]
#[case::transfer_to_string(
    "default { +\"sales\" }",
    ExecutionError::NotAContext { found: "string \"sales\"".to_owned() }
)]
#[case::method_on_string(
    "default { \"x\".upcase() }",
    ExecutionError::unknown_method("string \"x\"", "upcase")
)]
#[case::component_failure(
    "default { Voicemail.new().shred() }",
    ExecutionError::command("Voicemail.shred", CommandError::new("mailbox has no method shred"))
)]
fn body_errors_surface_unchanged(
    call: Call,
    #[case] source: &str,
    #[case] expected: ExecutionError,
) {
    let harness = Harness::new(source);
    let mut env = harness.environment(call);
    assert_eq!(harness.run(&mut env, "default"), Err(expected));
}

#[rstest]
fn cancellation_interrupts_between_statements(call: Call) {
    let cancel = CancellationToken::new();
    let trip = cancel.clone();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let tick = move |_call: &Call, _args: &[Value]| -> Result<Value, CommandError> {
        if counter.fetch_add(1, Ordering::SeqCst) == 1 {
            trip.cancel();
        }
        Ok(Value::Nil)
    };
    let commands = CommandSet::new().with_command("tick", tick);
    let contexts = Loader::without_components()
        .load("default {\n tick\n tick\n tick\n tick\n}")
        .expect("dialplan loads");
    let factory = EnvironmentFactory::new(
        Arc::new(PlatformCommands::new().with_platform("asterisk", commands)),
        Arc::new(ComponentRegistry::new()),
        Arc::new(contexts),
    );
    let mut env = factory.build(Arc::new(call)).expect("environment builds");
    let context = factory.contexts().get("default").cloned().expect("default");
    assert_eq!(env.execute(&context, &cancel), Ok(BodyOutcome::Interrupted));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
