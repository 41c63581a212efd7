use std::fmt;
use std::rc::Rc;

/// Document currently active in the host, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    pub path: String,
}

/// Live host application object. The runtime only ever holds shared
/// references to it and never ends its life.
pub trait HostApplication {
    fn name(&self) -> String;
    fn version(&self) -> String;
    fn active_document(&self) -> Option<DocumentInfo>;
}

pub type HostRef = Rc<dyn HostApplication>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Application,
    ControlledApplication,
    UiApplication,
    UiControlledApplication,
}

impl HostKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::ControlledApplication => "controlled-application",
            Self::UiApplication => "ui-application",
            Self::UiControlledApplication => "ui-controlled-application",
        }
    }
}

/// One of the four host handle kinds. Built by the host at the point it
/// hands a value over, so the runtime never inspects types itself.
#[derive(Clone)]
pub enum HostHandle {
    Application(HostRef),
    ControlledApplication(HostRef),
    UiApplication(HostRef),
    UiControlledApplication(HostRef),
}

impl HostHandle {
    pub fn kind(&self) -> HostKind {
        match self {
            Self::Application(_) => HostKind::Application,
            Self::ControlledApplication(_) => HostKind::ControlledApplication,
            Self::UiApplication(_) => HostKind::UiApplication,
            Self::UiControlledApplication(_) => HostKind::UiControlledApplication,
        }
    }

    pub fn host(&self) -> &HostRef {
        match self {
            Self::Application(host)
            | Self::ControlledApplication(host)
            | Self::UiApplication(host)
            | Self::UiControlledApplication(host) => host,
        }
    }
}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHandle")
            .field("kind", &self.kind())
            .field("name", &self.host().name())
            .finish()
    }
}

/// Value the host reports as the sender of an event.
#[derive(Debug, Clone)]
pub enum EventSender {
    Host(HostHandle),
    /// A sender type this runtime does not know about.
    Unrecognized { type_name: String },
}

impl From<HostHandle> for EventSender {
    fn from(handle: HostHandle) -> Self {
        Self::Host(handle)
    }
}

/// Data the host passes along when a command is invoked from its UI.
#[derive(Clone)]
pub struct CommandInvocation {
    pub ui_application: HostRef,
    pub selected_elements: Vec<i64>,
}

impl fmt::Debug for CommandInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandInvocation")
            .field("ui_application", &self.ui_application.name())
            .field("selected_elements", &self.selected_elements)
            .finish()
    }
}

/// Fixed-value host used by the command line host and by tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticHost {
    pub name: String,
    pub version: String,
    pub document: Option<DocumentInfo>,
}

impl StaticHost {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            document: None,
        }
    }

    pub fn with_document(mut self, title: impl Into<String>, path: impl Into<String>) -> Self {
        self.document = Some(DocumentInfo {
            title: title.into(),
            path: path.into(),
        });
        self
    }

    pub fn into_ref(self) -> HostRef {
        Rc::new(self)
    }
}

impl HostApplication for StaticHost {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn active_document(&self) -> Option<DocumentInfo> {
        self.document.clone()
    }
}

#[cfg(test)]
mod host_tests {
    use super::*;

    #[test]
    fn host_handle_reports_kind_and_host() {
        let host = StaticHost::new("Modeler", "2025").into_ref();
        let handle = HostHandle::UiApplication(Rc::clone(&host));
        assert_eq!(handle.kind(), HostKind::UiApplication);
        assert_eq!(handle.host().name(), "Modeler");
        assert!(format!("{:?}", handle).contains("UiApplication"));
    }

    #[test]
    fn static_host_exposes_optional_document() {
        let host = StaticHost::new("Modeler", "2025").with_document("Tower", "/p/tower.mdl");
        let document = host.active_document().expect("document");
        assert_eq!(document.title, "Tower");
        assert!(StaticHost::new("a", "b").active_document().is_none());
    }
}
