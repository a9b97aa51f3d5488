//! Human-readable one-line notices on stderr describing what the launcher is
//! about to do. Muted entirely by `LUNA_MUTE`.

use std::cell::RefCell;
use std::io::Write;

use crate::color::paint;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Action {
    /// Handing straight to the ssh client (or copying, for install).
    Direct,
    Connecting,
    Generating,
    /// A virtualenv was dropped from the environment.
    Sanitized,
}

impl Action {
    fn label(self) -> &'static str {
        match self {
            Action::Direct => "direct",
            Action::Connecting => "connecting",
            Action::Generating => "generating",
            Action::Sanitized => "sanitized",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Action::Direct => "\x1b[32;1m",
            Action::Connecting => "\x1b[36;1m",
            Action::Generating => "\x1b[34;1m",
            Action::Sanitized => "\x1b[90m",
        }
    }
}

pub struct Notifier {
    mute: bool,
    use_color: bool,
    sink: RefCell<Box<dyn Write>>,
}

impl Notifier {
    pub fn stderr(mute: bool) -> Self {
        Self {
            mute,
            use_color: crate::color::color_enabled_stderr(),
            sink: RefCell::new(Box::new(std::io::stderr())),
        }
    }

    /// Notices go to `sink` instead of stderr; never colored.
    pub fn to_writer(mute: bool, sink: Box<dyn Write>) -> Self {
        Self {
            mute,
            use_color: false,
            sink: RefCell::new(sink),
        }
    }

    pub fn notice(&self, action: Action, detail: &str) {
        if self.mute {
            return;
        }
        let tag = paint(self.use_color, action.color(), action.label());
        let line = if detail.is_empty() {
            format!("luna: {tag}")
        } else {
            format!("luna: {tag}: {detail}")
        };
        let mut sink = self.sink.borrow_mut();
        let _ = writeln!(sink, "{line}");
    }
}
