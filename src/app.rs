use std::path::PathBuf;

use crossterm::event::KeyEvent;
use tracing::{debug, info};

use crate::command::Command;
use crate::config::PhantomConfig;
use crate::external::KIND_BINARY;
use crate::input::{GlobalAction, map_global_key};
use crate::message::Message;
use crate::panel::{Panel, PanelState};
use crate::panels::cluster::ClusterPanel;
use crate::panels::dashboard::DashboardPanel;
use crate::panels::http::HttpPanel;
use crate::panels::launcher::LauncherPanel;
use crate::ui::CHROME_ROWS;

/// Root dispatcher: owns the tabs and routes every message.
pub struct App {
    running: bool,
    ready: bool,
    active_tab_index: usize,
    panels: Vec<PanelState>,
    status: String,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            running: true,
            ready: false,
            active_tab_index: 0,
            panels: vec![
                PanelState::Dashboard(DashboardPanel::new()),
                PanelState::Http(HttpPanel::new()),
                PanelState::Launcher(LauncherPanel::new("Git", "lazygit")),
                PanelState::Launcher(LauncherPanel::new("Docker", "lazydocker")),
                PanelState::Cluster(ClusterPanel::new()),
                PanelState::Launcher(LauncherPanel::new("Nvim", "nvim")),
            ],
            status: String::new(),
        }
    }

    /// Startup work: each panel's own init, binary lookups, then the config.
    pub fn init(&mut self, config_path: Option<PathBuf>) -> Vec<Command> {
        let mut commands = Vec::new();
        for panel in &mut self.panels {
            commands.extend(panel.as_panel_mut().init());
        }
        for panel in &self.panels {
            let binary = match panel {
                PanelState::Launcher(launcher) => launcher.binary(),
                PanelState::Cluster(_) => KIND_BINARY,
                _ => continue,
            };
            commands.push(Command::CheckBinary {
                binary: binary.to_string(),
            });
        }
        commands.push(Command::LoadConfig { path: config_path });
        commands
    }

    pub fn update(&mut self, message: Message) -> Vec<Command> {
        match message {
            Message::Key(key) => self.handle_key(key),
            Message::Resize { width, height } => {
                self.resize(width, height);
                Vec::new()
            }
            Message::BinaryChecked { binary, found } => {
                self.apply_binary_check(&binary, found);
                Vec::new()
            }
            Message::ConfigLoaded(config) => {
                self.apply_config(config);
                Vec::new()
            }
            Message::LaunchFinished { ref result, .. } => {
                self.status = match result {
                    Ok(status) => status.clone(),
                    Err(error) => error.clone(),
                };
                self.broadcast(&message)
            }
            other => self.broadcast(&other),
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn ready(&self) -> bool {
        self.ready
    }

    pub fn active_tab_index(&self) -> usize {
        self.active_tab_index
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn tab_titles(&self) -> Vec<&str> {
        self.panels
            .iter()
            .map(|panel| panel.as_panel().title())
            .collect()
    }

    pub fn active_panel(&self) -> &dyn Panel {
        self.panels[self.active_tab_index].as_panel()
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let capturing = self.active_panel().captures_text();
        match map_global_key(key, capturing) {
            Some(GlobalAction::Quit) => {
                info!("quit requested");
                self.running = false;
                Vec::new()
            }
            Some(GlobalAction::NextTab) => {
                self.switch_tab_by_offset(1);
                Vec::new()
            }
            Some(GlobalAction::PrevTab) => {
                self.switch_tab_by_offset(-1);
                Vec::new()
            }
            None => self.panels[self.active_tab_index]
                .as_panel_mut()
                .update(&Message::Key(key)),
        }
    }

    fn switch_tab_by_offset(&mut self, delta: isize) {
        if self.panels.is_empty() {
            return;
        }

        let len = self.panels.len() as isize;
        let current = self.active_tab_index as isize;
        self.active_tab_index = (current + delta).rem_euclid(len) as usize;
        let active = &self.panels[self.active_tab_index];
        debug!(
            "active tab -> {} ({:?})",
            active.as_panel().title(),
            active.kind()
        );
    }

    fn resize(&mut self, width: u16, height: u16) {
        if !self.ready {
            info!("terminal ready at {width}x{height}");
        }
        self.ready = true;
        let body_height = height.saturating_sub(CHROME_ROWS);
        for panel in &mut self.panels {
            panel.as_panel_mut().resize(width, body_height);
        }
    }

    fn apply_binary_check(&mut self, binary: &str, found: bool) {
        for panel in &mut self.panels {
            match panel {
                PanelState::Launcher(launcher) if launcher.binary() == binary => {
                    launcher.set_installed(found);
                }
                PanelState::Cluster(cluster) if binary == KIND_BINARY => {
                    cluster.set_installed(found);
                }
                _ => {}
            }
        }
    }

    fn apply_config(&mut self, config: PhantomConfig) {
        if let Some(source) = &config.source {
            self.status = format!("Loaded config from {source}");
        }
        let http = self.panels.iter_mut().find_map(|panel| match panel {
            PanelState::Http(http) => Some(http),
            _ => None,
        });
        if let Some(http) = http {
            http.apply_config(config);
        }
    }

    /// Hands a non-key message to every panel; each ignores what it does not own.
    fn broadcast(&mut self, message: &Message) -> Vec<Command> {
        let mut commands = Vec::new();
        for panel in &mut self.panels {
            commands.extend(panel.as_panel_mut().update(message));
        }
        commands
    }

    #[cfg(test)]
    fn panel(&self, kind: crate::panel::PanelKind) -> &PanelState {
        self.panels
            .iter()
            .find(|panel| panel.kind() == kind)
            .expect("panel kind should exist")
    }
}

#[cfg(test)]
mod tests {
    use super::App;
    use crate::command::Command;
    use crate::config::PhantomConfig;
    use crate::message::Message;
    use crate::model::{ClusterJobKind, RequestItem};
    use crate::panel::{PanelKind, PanelState};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn launchers(app: &App) -> Vec<(&str, bool)> {
        app.panels
            .iter()
            .filter_map(|panel| match panel {
                PanelState::Launcher(launcher) => Some((launcher.binary(), launcher.installed())),
                _ => None,
            })
            .collect()
    }

    fn cluster_installed(app: &App) -> bool {
        match app.panel(PanelKind::Cluster) {
            PanelState::Cluster(cluster) => cluster.installed(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn tabs_are_in_display_order() {
        let app = App::new();
        assert_eq!(
            app.tab_titles(),
            vec!["Dashboard", "HTTP", "Git", "Docker", "Kind", "Nvim"]
        );
    }

    #[test]
    fn tab_advance_wraps_and_retreat_is_inverse() {
        let mut app = App::new();
        let count = app.tab_titles().len();
        for n in 1..=(count * 2 + 1) {
            let _ = app.update(key(KeyCode::Tab));
            assert_eq!(app.active_tab_index(), n % count);
        }
        let advanced = app.active_tab_index();
        let _ = app.update(key(KeyCode::Tab));
        let _ = app.update(Message::Key(KeyEvent::new(
            KeyCode::BackTab,
            KeyModifiers::SHIFT,
        )));
        assert_eq!(app.active_tab_index(), advanced);

        let mut app = App::new();
        let _ = app.update(key(KeyCode::BackTab));
        assert_eq!(app.active_tab_index(), count - 1);
    }

    #[test]
    fn first_resize_makes_app_ready() {
        let mut app = App::new();
        assert!(!app.ready());
        let _ = app.update(Message::Resize {
            width: 100,
            height: 40,
        });
        assert!(app.ready());
    }

    #[test]
    fn init_checks_binaries_and_loads_config() {
        let mut app = App::new();
        let commands = app.init(None);
        assert!(commands.contains(&Command::SampleSystem));
        assert!(commands.contains(&Command::ListClusters));
        for binary in ["lazygit", "lazydocker", "kind", "nvim"] {
            assert!(commands.contains(&Command::CheckBinary {
                binary: binary.to_string()
            }));
        }
        assert_eq!(commands.last(), Some(&Command::LoadConfig { path: None }));
    }

    #[test]
    fn binary_checks_route_by_name() {
        let mut app = App::new();
        let _ = app.update(Message::BinaryChecked {
            binary: "lazydocker".to_string(),
            found: true,
        });
        assert_eq!(
            launchers(&app),
            vec![("lazygit", false), ("lazydocker", true), ("nvim", false)]
        );

        assert!(!cluster_installed(&app));
        let _ = app.update(Message::BinaryChecked {
            binary: "kind".to_string(),
            found: true,
        });
        assert!(cluster_installed(&app));
        let _ = app.update(Message::BinaryChecked {
            binary: "kind".to_string(),
            found: false,
        });
        assert!(!cluster_installed(&app));
    }

    #[test]
    fn config_seeds_http_panel() {
        let mut app = App::new();
        let _ = app.update(Message::ConfigLoaded(PhantomConfig {
            source: Some("phantom.yaml".to_string()),
            templates: vec![RequestItem {
                name: "health".to_string(),
                method: "GET".to_string(),
                url: "http://localhost/health".to_string(),
                ..RequestItem::default()
            }],
            environment: Default::default(),
        }));
        assert_eq!(app.status(), "Loaded config from phantom.yaml");

        // Tab to HTTP, focus the list, load the first template.
        let _ = app.update(key(KeyCode::Tab));
        let _ = app.update(Message::Key(KeyEvent::new(
            KeyCode::Char('l'),
            KeyModifiers::CONTROL,
        )));
        let _ = app.update(Message::Key(KeyEvent::new(
            KeyCode::Char('l'),
            KeyModifiers::CONTROL,
        )));
        let _ = app.update(key(KeyCode::Enter));
        match app.panel(PanelKind::Http) {
            PanelState::Http(http) => assert_eq!(http.url(), "http://localhost/health"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn background_results_reach_hidden_panels() {
        let mut app = App::new();
        let _ = app.init(None);
        assert_eq!(app.active_tab_index(), 0);

        let commands = app.update(Message::ClusterOpDone {
            kind: ClusterJobKind::Delete,
            result: Ok(()),
        });
        assert_eq!(commands, vec![Command::ListClusters]);

        let _ = app.update(Message::ClusterListReady(vec!["alpha".to_string()]));
        match app.panel(PanelKind::Cluster) {
            PanelState::Cluster(cluster) => {
                assert_eq!(cluster.clusters(), ["alpha".to_string()]);
                assert!(cluster.job().is_none());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn keys_only_reach_the_active_panel() {
        let mut app = App::new();
        let _ = app.update(Message::BinaryChecked {
            binary: "lazygit".to_string(),
            found: true,
        });
        assert!(app.update(key(KeyCode::Enter)).is_empty());

        let _ = app.update(key(KeyCode::Tab));
        let _ = app.update(key(KeyCode::Tab));
        assert_eq!(
            app.update(key(KeyCode::Enter)),
            vec![Command::Launch {
                binary: "lazygit".to_string()
            }]
        );
    }

    #[test]
    fn q_quits_except_while_typing() {
        let mut app = App::new();
        let _ = app.update(key(KeyCode::Tab));
        assert!(app.active_panel().captures_text());
        let _ = app.update(key(KeyCode::Char('q')));
        assert!(app.running());

        let _ = app.update(key(KeyCode::Tab));
        let _ = app.update(key(KeyCode::Char('q')));
        assert!(!app.running());

        let mut app = App::new();
        let _ = app.update(Message::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(!app.running());
    }

    #[test]
    fn launch_result_updates_status() {
        let mut app = App::new();
        let _ = app.update(Message::LaunchFinished {
            binary: "nvim".to_string(),
            result: Ok("nvim exited cleanly".to_string()),
        });
        assert_eq!(app.status(), "nvim exited cleanly");
    }
}
