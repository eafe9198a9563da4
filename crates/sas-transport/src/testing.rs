//! Testing utilities for transport consumers.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::address::MdpAddress;
use crate::frame::Frame;
use crate::traits::{MeshTransport, TransportError};

type Responder = Box<dyn Fn(&Frame) -> Vec<Frame> + Send + Sync>;
type Service = Arc<dyn Fn(&Frame) -> Option<Frame> + Send + Sync>;

/// Granularity of the simulated poll wait.
const POLL_SLICE: Duration = Duration::from_millis(2);

/// Mock transport for testing.
///
/// Frames can be injected directly, or produced by a responder closure that
/// sees every sent frame and returns the frames the "network" delivers back.
pub struct MockTransport {
    bound: Mutex<HashSet<MdpAddress>>,
    sent: Mutex<Vec<Frame>>,
    recv_queue: Mutex<VecDeque<Frame>>,
    recv_failures: Mutex<VecDeque<TransportError>>,
    responder: Option<Responder>,
    connected: AtomicBool,
    fail_bind: AtomicBool,
    bind_calls: AtomicUsize,
    send_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    recv_calls: AtomicUsize,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self {
            bound: Mutex::new(HashSet::new()),
            sent: Mutex::new(Vec::new()),
            recv_queue: Mutex::new(VecDeque::new()),
            recv_failures: Mutex::new(VecDeque::new()),
            responder: None,
            connected: AtomicBool::new(true),
            fail_bind: AtomicBool::new(false),
            bind_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            recv_calls: AtomicUsize::new(0),
        }
    }

    /// Answer every sent frame with whatever `responder` returns.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&Frame) -> Vec<Frame> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Make every bind fail.
    pub fn with_failing_bind(self) -> Self {
        self.fail_bind.store(true, Ordering::Relaxed);
        self
    }

    /// Inject a frame into the receive queue
    pub fn inject_recv(&self, frame: Frame) {
        self.recv_queue.lock().push_back(frame);
    }

    /// Make the next `recv` fail with `error`, ahead of any queued frame.
    pub fn fail_next_recv(&self, error: TransportError) {
        self.recv_failures.lock().push_back(error);
    }

    /// Get sent frames
    pub fn get_sent(&self) -> Vec<Frame> {
        self.sent.lock().clone()
    }

    /// Clear sent frames
    pub fn clear_sent(&self) {
        self.sent.lock().clear();
    }

    /// Currently bound local endpoints.
    pub fn bound(&self) -> Vec<MdpAddress> {
        self.bound.lock().iter().copied().collect()
    }

    /// Simulate disconnect
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Relaxed);
    }

    /// Simulate connect
    pub fn connect(&self) {
        self.connected.store(true, Ordering::Relaxed);
    }

    pub fn bind_calls(&self) -> usize {
        self.bind_calls.load(Ordering::Relaxed)
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::Relaxed)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::Relaxed)
    }

    pub fn recv_calls(&self) -> usize {
        self.recv_calls.load(Ordering::Relaxed)
    }

    /// Every call made through the [`MeshTransport`] interface.
    pub fn total_calls(&self) -> usize {
        self.bind_calls() + self.send_calls() + self.poll_calls() + self.recv_calls()
    }
}

impl MeshTransport for MockTransport {
    fn bind(&self, local: &MdpAddress) -> Result<(), TransportError> {
        self.bind_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_bind.load(Ordering::Relaxed) {
            return Err(TransportError::Bind {
                port: local.port,
                reason: "bind refused".to_string(),
            });
        }
        self.bound.lock().insert(*local);
        Ok(())
    }

    fn unbind(&self, local: &MdpAddress) {
        self.bound.lock().remove(local);
    }

    fn send(&self, frame: &Frame) -> Result<(), TransportError> {
        self.send_calls.fetch_add(1, Ordering::Relaxed);
        if !self.connected.load(Ordering::Relaxed) {
            return Err(TransportError::Disconnected);
        }

        self.sent.lock().push(frame.clone());

        if let Some(responder) = &self.responder {
            let replies = responder(frame);
            self.recv_queue.lock().extend(replies);
        }
        Ok(())
    }

    fn poll(&self, timeout: Duration) -> usize {
        self.poll_calls.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + timeout;
        loop {
            let ready = self.recv_queue.lock().len();
            let now = Instant::now();
            if ready > 0 || now >= deadline {
                return ready;
            }
            std::thread::sleep(POLL_SLICE.min(deadline - now));
        }
    }

    fn recv(&self, port: u32) -> Result<Frame, TransportError> {
        self.recv_calls.fetch_add(1, Ordering::Relaxed);
        if !self.connected.load(Ordering::Relaxed) {
            return Err(TransportError::Disconnected);
        }
        if let Some(error) = self.recv_failures.lock().pop_front() {
            return Err(error);
        }

        let mut queue = self.recv_queue.lock();
        let position = queue
            .iter()
            .position(|f| f.destination().port == port)
            .ok_or(TransportError::NothingPending(port))?;
        queue
            .remove(position)
            .ok_or(TransportError::NothingPending(port))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// In-process mesh that routes frames by destination address.
///
/// Services registered with [`LoopbackMesh::serve`] answer frames addressed
/// to them synchronously; bound sockets queue frames for [`MeshTransport::recv`].
/// Frames to an address with neither are dropped, as on a real mesh.
/// Clones share the same mesh.
#[derive(Clone, Default)]
pub struct LoopbackMesh {
    inner: Arc<MeshInner>,
}

#[derive(Default)]
struct MeshInner {
    services: Mutex<HashMap<MdpAddress, Service>>,
    inboxes: Mutex<HashMap<MdpAddress, VecDeque<Frame>>>,
    delivered: AtomicUsize,
    dropped: AtomicUsize,
}

impl LoopbackMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer frames sent to `address` with `service`.
    pub fn serve<F>(&self, address: MdpAddress, service: F)
    where
        F: Fn(&Frame) -> Option<Frame> + Send + Sync + 'static,
    {
        self.inner.services.lock().insert(address, Arc::new(service));
    }

    /// Stop answering frames sent to `address`.
    pub fn withdraw(&self, address: &MdpAddress) {
        self.inner.services.lock().remove(address);
    }

    /// Frames that reached a service or a bound socket.
    pub fn delivered(&self) -> usize {
        self.inner.delivered.load(Ordering::Relaxed)
    }

    /// Frames that had nowhere to go.
    pub fn dropped(&self) -> usize {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    fn route(&self, frame: Frame) {
        let service = self.inner.services.lock().get(frame.destination()).cloned();
        if let Some(service) = service {
            self.inner.delivered.fetch_add(1, Ordering::Relaxed);
            if let Some(reply) = service(&frame) {
                self.route(reply);
            }
            return;
        }

        let mut inboxes = self.inner.inboxes.lock();
        match inboxes.get_mut(frame.destination()) {
            Some(inbox) => {
                inbox.push_back(frame);
                self.inner.delivered.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.inner.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn pending(&self) -> usize {
        self.inner.inboxes.lock().values().map(VecDeque::len).sum()
    }
}

impl MeshTransport for LoopbackMesh {
    fn bind(&self, local: &MdpAddress) -> Result<(), TransportError> {
        let mut inboxes = self.inner.inboxes.lock();
        if inboxes.contains_key(local) {
            return Err(TransportError::Bind {
                port: local.port,
                reason: "address in use".to_string(),
            });
        }
        inboxes.insert(*local, VecDeque::new());
        Ok(())
    }

    fn unbind(&self, local: &MdpAddress) {
        self.inner.inboxes.lock().remove(local);
    }

    fn send(&self, frame: &Frame) -> Result<(), TransportError> {
        self.route(frame.clone());
        Ok(())
    }

    fn poll(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        loop {
            let ready = self.pending();
            let now = Instant::now();
            if ready > 0 || now >= deadline {
                return ready;
            }
            std::thread::sleep(POLL_SLICE.min(deadline - now));
        }
    }

    fn recv(&self, port: u32) -> Result<Frame, TransportError> {
        self.inner
            .inboxes
            .lock()
            .iter_mut()
            .filter(|(address, _)| address.port == port)
            .find_map(|(_, inbox)| inbox.pop_front())
            .ok_or(TransportError::NothingPending(port))
    }
}
