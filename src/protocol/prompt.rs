//! Console prompt tracking.
//!
//! The module prints a prompt such as `<4.00> ` whenever its console is idle.
//! The text depends on firmware version, so it is learned from the stream the
//! first time it is needed and matched literally afterwards.

use super::matcher::{self, ByteSource};
use crate::port::PortError;
use std::time::Duration;
use tracing::debug;

/// Longest prompt accepted, trailing space included.
pub const PROMPT_MAX_LEN: usize = 16;

/// Learned prompt literal, if any.
#[derive(Debug, Clone, Default)]
pub struct PromptTracker {
    prompt: Option<Vec<u8>>,
}

impl PromptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_learned(&self) -> bool {
        self.prompt.is_some()
    }

    /// The learned prompt, trailing space included.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.prompt.as_deref()
    }

    /// Lossy text form for logs and display.
    pub fn text(&self) -> Option<String> {
        self.as_bytes()
            .map(|p| String::from_utf8_lossy(p).into_owned())
    }

    /// Discard the learned prompt so the next wait learns it again.
    pub fn forget(&mut self) {
        self.prompt = None;
    }

    /// True if the learned prompt occurs anywhere in `text`.
    pub fn appears_in(&self, text: &[u8]) -> bool {
        match &self.prompt {
            Some(prompt) => memchr::memmem::find(text, prompt).is_some(),
            None => false,
        }
    }

    /// Scan for `<`, collect up to `>`, then require a single space.
    ///
    /// On any failure (timeout, a character other than space after `>`, or
    /// running out of room before `>`) nothing is stored.
    pub fn learn<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        timeout: Duration,
    ) -> Result<bool, PortError> {
        while let Some(ch) = source.next_byte(timeout)? {
            if ch != b'<' {
                continue;
            }

            let mut candidate = vec![b'<'];
            // Room for '<' ... '>' plus the trailing space.
            while candidate.len() < PROMPT_MAX_LEN - 1 {
                let Some(ch) = source.next_byte(timeout)? else {
                    return Ok(false);
                };
                candidate.push(ch);
                if ch == b'>' {
                    return match source.next_byte(timeout)? {
                        Some(b' ') => {
                            candidate.push(b' ');
                            debug!(prompt = %String::from_utf8_lossy(&candidate), "learned prompt");
                            self.prompt = Some(candidate);
                            Ok(true)
                        }
                        _ => Ok(false),
                    };
                }
            }
            return Ok(false);
        }
        Ok(false)
    }

    /// Wait for the prompt, learning it first if necessary.
    pub fn await_prompt<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        timeout: Duration,
    ) -> Result<bool, PortError> {
        match &self.prompt {
            Some(prompt) => matcher::find(source, prompt, timeout),
            None => self.learn(source, timeout),
        }
    }
}
