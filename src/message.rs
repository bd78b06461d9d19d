use crossterm::event::KeyEvent;

use crate::config::PhantomConfig;
use crate::model::{ClusterJobKind, HttpResponse, SystemSnapshot};
use crate::panel::PanelKind;

/// Every event that flows through the loop: terminal input, timers, and the
/// results of finished commands.
#[derive(Debug, Clone)]
pub enum Message {
    Key(KeyEvent),
    Resize {
        width: u16,
        height: u16,
    },
    /// Dashboard polling interval.
    Tick,
    /// Animation frame for busy indicators.
    SpinnerTick,
    BinaryChecked {
        binary: String,
        found: bool,
    },
    ConfigLoaded(PhantomConfig),
    HttpResponseReady(Result<HttpResponse, String>),
    ClusterListReady(Vec<String>),
    ClusterOpDone {
        kind: ClusterJobKind,
        result: Result<(), String>,
    },
    ClusterDescribeReady {
        name: String,
        text: String,
    },
    SystemSampled(SystemSnapshot),
    LaunchFinished {
        binary: String,
        result: Result<String, String>,
    },
    Error {
        origin: PanelKind,
        message: String,
    },
}
