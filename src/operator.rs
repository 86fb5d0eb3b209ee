//! Operator interaction surface. Calibration and the peripheral exercises
//! block on a human at the bench; everything they need from that human goes
//! through [`Operator`] so the flows stay scriptable in tests.

use std::io::{self, BufRead, Write};

use log::warn;

pub trait Operator {
    /// Displays a message, no reply expected.
    fn message(&mut self, text: &str);

    /// Blocks until the operator confirms or cancels the current step.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Blocks until the operator supplies a mass in grams, `None` on cancel.
    fn read_grams(&mut self, prompt: &str) -> Option<f64>;
}

/// Stdin/stdout operator for the interactive harness.
pub struct Console;

impl Console {
    /// Prints `prompt` and returns the operator's trimmed reply line.
    pub fn read_reply(&mut self, prompt: &str) -> io::Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;

        Ok(line.trim().to_string())
    }
}

impl Operator for Console {
    fn message(&mut self, text: &str) {
        println!("{text}");
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        match self.read_reply(&format!("{prompt} [Enter to continue, q to cancel]: ")) {
            Ok(reply) => !reply.eq_ignore_ascii_case("q"),
            Err(e) => {
                warn!("failed to read operator reply, treating as cancel: {e}");
                false
            }
        }
    }

    fn read_grams(&mut self, prompt: &str) -> Option<f64> {
        loop {
            let reply = match self.read_reply(&format!("{prompt} (q to cancel): ")) {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("failed to read operator reply, treating as cancel: {e}");
                    return None;
                }
            };

            if reply.is_empty() || reply.eq_ignore_ascii_case("q") {
                return None;
            }

            match reply.parse::<f64>() {
                Ok(grams) => return Some(grams),
                Err(_) => println!("Could not parse '{reply}' as a number of grams, try again."),
            }
        }
    }
}
