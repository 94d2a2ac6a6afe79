//! Scripted mock transport for testing.
//!
//! Provides a `MockTransport` that simulates the module without hardware.
//! Bytes can be queued for reading immediately, or attached to a conversation
//! script so they only appear after the driver has written a given command.

use super::error::PortError;
use super::traits::Transport;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// One step of a scripted conversation.
#[derive(Debug, Clone)]
struct ScriptStep {
    /// Bytes the driver must write (as a suffix of everything written since
    /// the previous step fired).
    trigger: Vec<u8>,
    /// Bytes the module "answers" with once the trigger is seen.
    response: Vec<u8>,
}

/// Inner state of the mock, shared between clones.
#[derive(Debug, Default)]
struct MockState {
    /// Bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of every write call.
    write_log: Vec<Vec<u8>>,
    /// Written bytes not yet matched against the script head.
    unmatched: Vec<u8>,
    /// Pending conversation steps, consumed in order.
    script: VecDeque<ScriptStep>,
    /// Fail the next operation with a transport fault.
    fail_next: bool,
    /// Fail every write that starts with these bytes.
    failing_writes: Option<Vec<u8>>,
    /// Number of flush calls.
    flushes: usize,
}

impl MockState {
    fn take_fault(&mut self) -> Result<(), PortError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(PortError::fault("simulated transport failure"));
        }
        Ok(())
    }

    fn advance_script(&mut self) {
        while self
            .script
            .front()
            .is_some_and(|step| self.unmatched.ends_with(&step.trigger))
        {
            if let Some(step) = self.script.pop_front() {
                self.read_queue.extend(step.response);
                self.unmatched.clear();
            }
        }
    }
}

/// Mock transport implementation for testing.
///
/// This implementation allows you to:
/// - Enqueue data to be returned by read operations
/// - Script replies that are released only after a command is written
/// - Inspect what data was written
/// - Simulate transport faults
///
/// Clones share state, so a test can keep one handle while the driver owns
/// another.
///
/// # Example
/// ```
/// use wifly_driver::port::{MockTransport, Transport};
///
/// let mut port = MockTransport::new("MOCK0");
/// port.respond_to(b"exit\r", b"EXIT\r\n");
///
/// assert_eq!(port.read_byte().unwrap(), None);
/// port.write_bytes(b"exit\r").unwrap();
/// assert_eq!(port.read_byte().unwrap(), Some(b'E'));
/// assert_eq!(port.written(), b"exit\r");
/// ```
#[derive(Clone)]
pub struct MockTransport {
    /// The transport name/identifier.
    name: String,
    /// Shared state.
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Enqueue bytes to be returned by subsequent reads.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Append a conversation step: once `trigger` has been written, `response`
    /// becomes readable.
    ///
    /// Steps fire strictly in the order they were added. An empty trigger
    /// fires as soon as the previous step has.
    pub fn respond_to(&self, trigger: &[u8], response: &[u8]) {
        let mut state = self.state.lock();
        state.script.push_back(ScriptStep {
            trigger: trigger.to_vec(),
            response: response.to_vec(),
        });
        state.advance_script();
    }

    /// Number of conversation steps that have not fired yet.
    pub fn pending_steps(&self) -> usize {
        self.state.lock().script.len()
    }

    /// Get a copy of every individual write.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All written bytes, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    /// All written bytes as lossy text, convenient for assertions.
    pub fn written_text(&self) -> String {
        String::from_utf8_lossy(&self.written()).into_owned()
    }

    /// Clear the write log.
    pub fn clear_write_log(&self) {
        self.state.lock().write_log.clear();
    }

    /// Make the next transport operation fail.
    pub fn fail_next(&self) {
        self.state.lock().fail_next = true;
    }

    /// Make every write starting with `prefix` fail.
    pub fn fail_writes_starting_with(&self, prefix: &[u8]) {
        self.state.lock().failing_writes = Some(prefix.to_vec());
    }

    /// Number of bytes waiting to be read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Number of times `flush` was called.
    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }
}

impl Transport for MockTransport {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        state.take_fault()?;
        if state
            .failing_writes
            .as_deref()
            .is_some_and(|prefix| data.starts_with(prefix))
        {
            return Err(PortError::fault("simulated write failure"));
        }

        state.write_log.push(data.to_vec());
        state.unmatched.extend_from_slice(data);
        state.advance_script();

        Ok(data.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        let mut state = self.state.lock();
        state.take_fault()?;
        Ok(state.read_queue.pop_front())
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, PortError> {
        let mut state = self.state.lock();
        state.take_fault()?;
        Ok(state.read_queue.front().copied())
    }

    fn bytes_available(&mut self) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        state.take_fault()?;
        Ok(state.read_queue.len())
    }

    fn flush(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.take_fault()?;
        state.flushes += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockTransport")
            .field("name", &self.name)
            .field("available_bytes", &state.read_queue.len())
            .field("pending_steps", &state.script.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_read() {
        let mut port = MockTransport::new("MOCK0");
        port.enqueue_read(b"Hi");

        assert_eq!(port.bytes_available().unwrap(), 2);
        assert_eq!(port.peek_byte().unwrap(), Some(b'H'));
        assert_eq!(port.read_byte().unwrap(), Some(b'H'));
        assert_eq!(port.read_byte().unwrap(), Some(b'i'));
        assert_eq!(port.read_byte().unwrap(), None);
    }

    #[test]
    fn test_write_logging() {
        let mut port = MockTransport::new("MOCK0");
        port.write_bytes(b"Test1").unwrap();
        port.write_bytes(b"Test2").unwrap();

        let log = port.get_write_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], b"Test1");
        assert_eq!(port.written(), b"Test1Test2");
    }

    #[test]
    fn test_script_fires_in_order() {
        let mut port = MockTransport::new("MOCK0");
        port.respond_to(b"get ip\r", b"IP=1.2.3.4\r\n");
        port.respond_to(b"exit\r", b"EXIT\r\n");

        // Second trigger first: nothing happens, the head step is still waiting.
        port.write_bytes(b"exit\r").unwrap();
        assert_eq!(port.available_bytes(), 0);

        port.write_bytes(b"get ip").unwrap();
        port.write_bytes(b"\r").unwrap();
        assert_eq!(port.available_bytes(), 12);
        assert_eq!(port.pending_steps(), 1);
    }

    #[test]
    fn test_empty_trigger_chains() {
        let mut port = MockTransport::new("MOCK0");
        port.respond_to(b"open\r", b"<4.00> ");
        port.respond_to(b"", b"*OPEN*");

        port.write_bytes(b"open\r").unwrap();
        assert_eq!(port.available_bytes(), 13);
        assert_eq!(port.pending_steps(), 0);
    }

    #[test]
    fn test_fault_simulation() {
        let mut port = MockTransport::new("MOCK0");
        port.fail_next();

        assert!(matches!(port.read_byte(), Err(PortError::Fault(_))));
        assert_eq!(port.read_byte().unwrap(), None);
    }

    #[test]
    fn test_prefix_write_fault() {
        let mut port = MockTransport::new("MOCK0");
        port.fail_writes_starting_with(b"open ");

        assert!(matches!(
            port.write_bytes(b"open 10.0.0.5 80\r"),
            Err(PortError::Fault(_))
        ));
        port.write_bytes(b"exit\r").unwrap();
        assert_eq!(port.written_text(), "exit\r");
    }

    #[test]
    fn test_clones_share_state() {
        let handle = MockTransport::new("MOCK0");
        let mut port = handle.clone();

        port.write_bytes(b"$$$").unwrap();
        port.flush().unwrap();
        assert_eq!(handle.written(), b"$$$");
        assert_eq!(handle.flush_count(), 1);
    }
}
