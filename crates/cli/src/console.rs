//! Stdin console
//!
//! Reads one command per line, submits it to the kernel and waits for the
//! event before reading the next line. Replies reach stdout through the
//! [`Console`] output.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing::debug;
use zbot_kernel::{Kernel, Output};

/// Origin id of events typed at the console.
pub const CONSOLE_ORIGIN: &str = "console";

/// Output printing replies on stdout.
#[derive(Debug, Default)]
pub struct Console;

impl Output for Console {
    fn id(&self) -> &str {
        CONSOLE_ORIGIN
    }

    fn say(&self, _channel: &str, txt: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", txt);
        let _ = stdout.flush();
    }
}

/// Feed lines from `input` to the kernel until end of input.
pub fn run<R: BufRead>(kernel: &Kernel, input: R) {
    kernel.bus().add(Arc::new(Console));
    let interactive = io::IsTerminal::is_terminal(&io::stdin());
    prompt(interactive);
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                debug!(error = %e, "console read failed");
                break;
            }
        };
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            kernel.submit_text(CONSOLE_ORIGIN, line).wait();
        }
        prompt(interactive);
    }
}

fn prompt(interactive: bool) {
    if interactive {
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "> ");
        let _ = stdout.flush();
    }
}
