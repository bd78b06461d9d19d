use ratatui::Frame;
use ratatui::layout::Rect;

use crate::command::Command;
use crate::message::Message;
use crate::panels::cluster::ClusterPanel;
use crate::panels::dashboard::DashboardPanel;
use crate::panels::http::HttpPanel;
use crate::panels::launcher::LauncherPanel;

/// Capabilities every tab provides to the dispatcher.
///
/// `update` must be total over [`Message`]: anything a panel does not own is
/// a no-op, since non-key messages are broadcast to every panel.
pub trait Panel {
    fn title(&self) -> &str;

    fn init(&mut self) -> Vec<Command> {
        Vec::new()
    }

    fn update(&mut self, message: &Message) -> Vec<Command>;

    fn render(&self, frame: &mut Frame, area: Rect);

    fn resize(&mut self, width: u16, height: u16);

    /// True while plain characters are text entry rather than bindings.
    fn captures_text(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PanelKind {
    Dashboard,
    Http,
    Launcher,
    Cluster,
}

pub enum PanelState {
    Dashboard(DashboardPanel),
    Http(HttpPanel),
    Launcher(LauncherPanel),
    Cluster(ClusterPanel),
}

impl PanelState {
    pub fn kind(&self) -> PanelKind {
        match self {
            Self::Dashboard(_) => PanelKind::Dashboard,
            Self::Http(_) => PanelKind::Http,
            Self::Launcher(_) => PanelKind::Launcher,
            Self::Cluster(_) => PanelKind::Cluster,
        }
    }

    pub fn as_panel(&self) -> &dyn Panel {
        match self {
            Self::Dashboard(panel) => panel,
            Self::Http(panel) => panel,
            Self::Launcher(panel) => panel,
            Self::Cluster(panel) => panel,
        }
    }

    pub fn as_panel_mut(&mut self) -> &mut dyn Panel {
        match self {
            Self::Dashboard(panel) => panel,
            Self::Http(panel) => panel,
            Self::Launcher(panel) => panel,
            Self::Cluster(panel) => panel,
        }
    }
}
