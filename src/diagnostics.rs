// src/diagnostics.rs
//! Device query console. In demo mode every command is answered from a fixed
//! response table.
use std::collections::VecDeque;

use chrono::{DateTime, Utc};

pub const QUICK_COMMANDS: [&str; 11] = [
    "GET RUN ALL",
    "GET RUN O2CONC",
    "GET RUN BLPRESS",
    "GET RUN SPO2",
    "GET RUN PULSE",
    "GET RUN ALT",
    "GET RUN FINALALT",
    "GET RUN ELTIME",
    "GET RUN REMTIME",
    "GET INFO",
    "GET STATUS",
];

pub const HISTORY_LIMIT: usize = 50;
pub const MFC_CHANNELS: std::ops::RangeInclusive<u8> = 0..=9;
pub const ADC_CHANNELS: std::ops::RangeInclusive<u8> = 1..=16;

/// Canned reply for `command`; anything unknown gets a generic demo reply.
pub fn simulated_response(command: &str) -> String {
    let canned = match command {
        "GET RUN ALL" => "1,RUN,25000,ASCEND,15.5,5.2,120,300,92.5,78",
        "GET RUN O2CONC" => "15.5",
        "GET RUN BLPRESS" => "5.2",
        "GET RUN SPO2" => "92.5",
        "GET RUN PULSE" => "78",
        "GET RUN ALT" => "25000",
        "GET INFO" => "ROBD2-9515 v2.1.3",
        "GET STATUS" => "OK",
        other => return format!("Response for: {other} (Demo Mode)"),
    };
    canned.to_owned()
}

pub fn mfc_command(channel: u8) -> String {
    format!("GET MFC {channel}")
}

pub fn adc_command(channel: u8) -> String {
    format!("GET ADC {channel}")
}

/// Free-form text wins over the quick-command selection when it is not blank.
pub fn resolve_command<'a>(custom: &'a str, selected: &'a str) -> &'a str {
    match custom.trim() {
        "" => selected,
        trimmed => trimmed,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommandRecord {
    pub command: String,
    pub response: String,
    pub sent_at: DateTime<Utc>,
}

/// Newest-first command history, capped at `HISTORY_LIMIT`.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticsConsole {
    history: VecDeque<CommandRecord>,
}

impl DiagnosticsConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send_at(&mut self, command: &str, sent_at: DateTime<Utc>) -> &CommandRecord {
        self.history.push_front(CommandRecord {
            command: command.to_owned(),
            response: simulated_response(command),
            sent_at,
        });
        self.history.truncate(HISTORY_LIMIT);
        &self.history[0]
    }

    pub fn send(&mut self, command: &str) -> &CommandRecord {
        self.send_at(command, Utc::now())
    }

    pub fn history(&self) -> impl Iterator<Item = &CommandRecord> {
        self.history.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_and_generic_responses() {
        assert_eq!(simulated_response("GET INFO"), "ROBD2-9515 v2.1.3");
        assert_eq!(simulated_response("GET STATUS"), "OK");
        assert_eq!(
            simulated_response("GET RUN ELTIME"),
            "Response for: GET RUN ELTIME (Demo Mode)"
        );
        assert_eq!(
            simulated_response(&mfc_command(3)),
            "Response for: GET MFC 3 (Demo Mode)"
        );
        assert_eq!(adc_command(12), "GET ADC 12");
    }

    #[test]
    fn custom_command_overrides_selection() {
        assert_eq!(resolve_command("  GET RUN SPO2 ", "GET INFO"), "GET RUN SPO2");
        assert_eq!(resolve_command("   ", "GET INFO"), "GET INFO");
    }

    #[test]
    fn history_is_newest_first_and_bounded() {
        let mut console = DiagnosticsConsole::new();
        assert!(console.is_empty());
        for i in 0..60 {
            console.send(&format!("CMD {i}"));
        }
        let commands: Vec<&str> = console.history().map(|r| r.command.as_str()).collect();
        assert_eq!(commands.len(), HISTORY_LIMIT);
        assert_eq!(commands[0], "CMD 59");
        assert_eq!(commands[HISTORY_LIMIT - 1], "CMD 10");
    }

    #[test]
    fn every_quick_command_gets_a_reply() {
        let mut console = DiagnosticsConsole::new();
        for cmd in QUICK_COMMANDS {
            let record = console.send(cmd);
            assert!(!record.response.is_empty());
        }
        assert_eq!(console.history().count(), QUICK_COMMANDS.len());
    }
}
