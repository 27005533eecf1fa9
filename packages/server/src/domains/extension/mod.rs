//! Extension domain - single-slot mailbox between the worker and the
//! out-of-process capture agent (browser extension).

pub mod channel;

pub use channel::{
    command_key, html_key, CapturedHtml, ExtensionAction, ExtensionChannel, ExtensionCommand,
};
