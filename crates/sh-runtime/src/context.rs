use std::path::PathBuf;

use sh_core::{
    CommandInvocation, EnvironmentSnapshot, EventSender, ExecutorConfig, HostHandle, HostRef,
    ScriptValue,
};
use tracing::{debug, warn};

/// What to do with an event sender whose type the runtime does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SenderPolicy {
    /// Drop it silently.
    #[default]
    Ignore,
    /// Drop it and emit a warning event.
    Warn,
}

/// Per-invocation configuration. Host handles are shared references the
/// context borrows from the host; disposing the context drops them without
/// affecting the host objects.
#[derive(Default)]
pub struct ExecutionContext {
    pub application: Option<HostRef>,
    pub controlled_application: Option<HostRef>,
    pub ui_application: Option<HostRef>,
    pub ui_controlled_application: Option<HostRef>,
    pub command: Option<CommandInvocation>,

    /// Module directories, in resolution priority order. Duplicates are kept.
    pub search_paths: Vec<PathBuf>,
    pub arguments: Vec<String>,
    pub config: ExecutorConfig,
    pub environment: Option<EnvironmentSnapshot>,
    pub log_path: Option<PathBuf>,

    pub refresh_engine: bool,
    pub config_mode: bool,
    pub debug_mode: bool,
    pub executed_from_ui: bool,

    pub sender_policy: SenderPolicy,
    event_sender: Option<HostHandle>,
    event_args: Option<ScriptValue>,
    disposed: bool,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_environment(mut self, environment: EnvironmentSnapshot) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_ui_application(mut self, host: HostRef) -> Self {
        self.ui_application = Some(host);
        self
    }

    pub fn with_command(mut self, command: CommandInvocation) -> Self {
        self.command = Some(command);
        self
    }

    /// Stores the sender in its typed slot, replacing any earlier sender.
    /// `None` keeps the current sender; unrecognized senders are dropped
    /// according to [`SenderPolicy`].
    pub fn set_event_sender(&mut self, sender: Option<EventSender>) {
        match sender {
            None => {}
            Some(EventSender::Host(handle)) => {
                debug!(
                    target: "scripthost::context",
                    kind = handle.kind().as_str(),
                    "event sender set"
                );
                self.event_sender = Some(handle);
            }
            Some(EventSender::Unrecognized { type_name }) => {
                if self.sender_policy == SenderPolicy::Warn {
                    warn!(
                        target: "scripthost::context",
                        type_name = type_name.as_str(),
                        "ignoring event sender of unrecognized type"
                    );
                }
            }
        }
    }

    pub fn event_sender(&self) -> Option<&HostHandle> {
        self.event_sender.as_ref()
    }

    pub fn set_event_args(&mut self, args: Option<ScriptValue>) {
        self.event_args = args;
    }

    pub fn event_args(&self) -> Option<&ScriptValue> {
        self.event_args.as_ref()
    }

    /// Releases every borrowed handle and sequence. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if !self.disposed {
            debug!(target: "scripthost::context", "disposing execution context");
        }
        self.application = None;
        self.controlled_application = None;
        self.ui_application = None;
        self.ui_controlled_application = None;
        self.command = None;
        self.search_paths = Vec::new();
        self.arguments = Vec::new();
        self.event_sender = None;
        self.event_args = None;
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod context_tests {
    use super::*;

    use std::rc::Rc;

    use sh_core::{HostKind, StaticHost};

    fn host(name: &str) -> HostRef {
        StaticHost::new(name, "1.0").into_ref()
    }

    #[test]
    fn set_event_sender_keeps_exactly_one_slot() {
        let mut context = ExecutionContext::new();
        context.set_event_sender(Some(HostHandle::UiApplication(host("ui")).into()));
        assert_eq!(
            context.event_sender().map(HostHandle::kind),
            Some(HostKind::UiApplication)
        );

        context.set_event_sender(Some(HostHandle::ControlledApplication(host("db")).into()));
        let sender = context.event_sender().expect("sender");
        assert_eq!(sender.kind(), HostKind::ControlledApplication);
        assert_eq!(sender.host().name(), "db");
    }

    #[test]
    fn set_event_sender_none_keeps_prior_slot() {
        let mut context = ExecutionContext::new();
        context.set_event_sender(Some(HostHandle::Application(host("app")).into()));
        context.set_event_sender(None);
        assert_eq!(
            context.event_sender().map(HostHandle::kind),
            Some(HostKind::Application)
        );
    }

    #[test]
    fn unrecognized_sender_is_dropped_under_both_policies() {
        for policy in [SenderPolicy::Ignore, SenderPolicy::Warn] {
            let mut context = ExecutionContext {
                sender_policy: policy,
                ..ExecutionContext::default()
            };
            context.set_event_sender(Some(EventSender::Unrecognized {
                type_name: "DocumentChangedArgs".to_string(),
            }));
            assert!(context.event_sender().is_none());

            context.set_event_sender(Some(HostHandle::Application(host("app")).into()));
            context.set_event_sender(Some(EventSender::Unrecognized {
                type_name: "Other".to_string(),
            }));
            assert_eq!(
                context.event_sender().map(HostHandle::kind),
                Some(HostKind::Application)
            );
        }
    }

    #[test]
    fn dispose_releases_handles_but_not_host_objects() {
        let shared = host("shared");
        let mut context = ExecutionContext::new()
            .with_ui_application(Rc::clone(&shared))
            .with_search_path("/lib")
            .with_search_path("/lib")
            .with_argument("--fast");
        context.set_event_sender(Some(HostHandle::Application(Rc::clone(&shared)).into()));
        context.set_event_args(Some(ScriptValue::from("opened")));
        assert_eq!(context.search_paths.len(), 2);
        assert_eq!(Rc::strong_count(&shared), 3);

        context.dispose();
        context.dispose();

        assert!(context.is_disposed());
        assert!(context.ui_application.is_none());
        assert!(context.event_sender().is_none());
        assert!(context.event_args().is_none());
        assert!(context.search_paths.is_empty());
        assert!(context.arguments.is_empty());
        assert_eq!(Rc::strong_count(&shared), 1);
        assert_eq!(shared.name(), "shared");
    }
}
