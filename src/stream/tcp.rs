//! TCP stream transport
//!
//! The outlet listens on a TCP socket. Every accepted consumer first receives
//! the [`StreamInfo`] as one JSON line, followed by binary sample frames:
//!
//! ```text
//! +----------------+----------------------------------+
//! | seq: u64 (LE)  | channel_count × f32 (LE)         |
//! +----------------+----------------------------------+
//! ```
//!
//! # Threads
//!
//! - One acceptor thread hands new connections to the outlet over a channel.
//! - One writer thread per consumer drains that consumer's bounded queue.
//!
//! [`Outlet::push_sample`] only does `try_send` on each queue, so a slow or
//! stalled consumer loses samples instead of stalling acquisition. A consumer
//! whose writer fails is dropped on the next push.

use super::metadata::StreamInfo;
use super::outlet_trait::{Outlet, StreamTransport};
use crate::error::{Result, StreamError};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How often the acceptor checks for new connections and shutdown
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Size of the per-frame sequence number
const SEQ_BYTES: usize = 8;

/// Encode one sample frame
pub fn encode_frame(seq: u64, sample: &[f32]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(SEQ_BYTES + sample.len() * 4);
    frame.extend_from_slice(&seq.to_le_bytes());
    for value in sample {
        frame.extend_from_slice(&value.to_le_bytes());
    }
    frame
}

/// Decode one sample frame of `channel_count` channels
pub fn decode_frame(bytes: &[u8], channel_count: usize) -> Option<(u64, Vec<f32>)> {
    if bytes.len() != SEQ_BYTES + channel_count * 4 {
        return None;
    }
    let (seq_bytes, payload) = bytes.split_at(SEQ_BYTES);
    let seq = u64::from_le_bytes(seq_bytes.try_into().ok()?);
    let values = payload
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    Some((seq, values))
}

// ==================== Transport ====================

/// Transport creating TCP outlets on a fixed listen address
#[derive(Debug, Clone)]
pub struct TcpTransport {
    listen: String,
}

impl TcpTransport {
    /// Create a transport listening on `listen` (e.g. `0.0.0.0:16571`)
    pub fn new(listen: impl Into<String>) -> Self {
        Self {
            listen: listen.into(),
        }
    }
}

impl StreamTransport for TcpTransport {
    type Outlet = TcpOutlet;

    fn create_outlet(
        &mut self,
        info: &StreamInfo,
        chunk_size: u32,
        max_buffered: u32,
    ) -> Result<TcpOutlet> {
        let listener = TcpListener::bind(self.listen.as_str()).map_err(|e| {
            StreamError::Transport(format!("Failed to listen on {}: {}", self.listen, e))
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let header: Arc<str> = Arc::from(info.to_json()?);
        let stop = Arc::new(AtomicBool::new(false));
        let (link_tx, link_rx) = unbounded();

        let acceptor = {
            let stop = stop.clone();
            let options = WriterOptions {
                header,
                queue_len: max_buffered.max(1) as usize,
                chunk_size: chunk_size as usize,
            };
            thread::Builder::new()
                .name("outlet-acceptor".to_string())
                .spawn(move || run_acceptor(listener, options, link_tx, stop))?
        };

        tracing::info!(
            "Stream '{}' ({} channels) listening on {}",
            info.name,
            info.channel_count,
            local_addr
        );

        Ok(TcpOutlet {
            local_addr,
            channel_count: info.channel_count,
            link_rx,
            consumers: Vec::new(),
            stop,
            acceptor: Some(acceptor),
            next_seq: 0,
            dropped: 0,
        })
    }
}

#[derive(Debug, Clone)]
struct WriterOptions {
    header: Arc<str>,
    queue_len: usize,
    chunk_size: usize,
}

/// Outlet-side handle to one consumer's writer thread
#[derive(Debug)]
struct ConsumerLink {
    peer: SocketAddr,
    frames: Sender<Arc<[u8]>>,
    alive: Arc<AtomicBool>,
}

impl ConsumerLink {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

fn run_acceptor(
    listener: TcpListener,
    options: WriterOptions,
    link_tx: Sender<ConsumerLink>,
    stop: Arc<AtomicBool>,
) {
    while !stop.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = spawn_writer(stream, peer, &options, &link_tx) {
                    tracing::warn!("Failed to set up consumer {}: {}", peer, e);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                tracing::warn!("Accepting consumer failed: {}", e);
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }
    tracing::debug!("Outlet acceptor stopped");
}

fn spawn_writer(
    stream: TcpStream,
    peer: SocketAddr,
    options: &WriterOptions,
    link_tx: &Sender<ConsumerLink>,
) -> std::io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;

    let (frames_tx, frames_rx) = bounded(options.queue_len);
    let alive = Arc::new(AtomicBool::new(true));
    let header = options.header.clone();
    let chunk_size = options.chunk_size;
    let writer_alive = alive.clone();

    thread::Builder::new()
        .name(format!("outlet-writer-{}", peer))
        .spawn(move || {
            if let Err(e) = run_writer(stream, &header, frames_rx, chunk_size) {
                tracing::info!("Consumer {} disconnected: {}", peer, e);
            }
            writer_alive.store(false, Ordering::SeqCst);
        })?;

    tracing::info!("Consumer {} attached", peer);
    let link = ConsumerLink {
        peer,
        frames: frames_tx,
        alive,
    };
    // The outlet may already be gone; the writer then exits on its own.
    let _ = link_tx.send(link);
    Ok(())
}

fn run_writer(
    mut stream: TcpStream,
    header: &str,
    frames: Receiver<Arc<[u8]>>,
    chunk_size: usize,
) -> std::io::Result<()> {
    stream.write_all(header.as_bytes())?;
    stream.write_all(b"\n")?;

    let mut batch = Vec::new();
    while let Ok(frame) = frames.recv() {
        batch.clear();
        batch.extend_from_slice(&frame);
        let mut batched = 1;
        while chunk_size == 0 || batched < chunk_size {
            match frames.try_recv() {
                Ok(next) => {
                    batch.extend_from_slice(&next);
                    batched += 1;
                }
                Err(_) => break,
            }
        }
        stream.write_all(&batch)?;
    }
    Ok(())
}

// ==================== Outlet ====================

/// TCP outlet created by [`TcpTransport`]
#[derive(Debug)]
pub struct TcpOutlet {
    local_addr: SocketAddr,
    channel_count: usize,
    link_rx: Receiver<ConsumerLink>,
    consumers: Vec<ConsumerLink>,
    stop: Arc<AtomicBool>,
    acceptor: Option<thread::JoinHandle<()>>,
    next_seq: u64,
    dropped: u64,
}

impl TcpOutlet {
    /// Address the outlet is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of live consumers
    pub fn consumer_count(&mut self) -> usize {
        self.refresh_consumers();
        self.consumers.len()
    }

    /// Samples dropped because a consumer queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn refresh_consumers(&mut self) {
        self.consumers.extend(self.link_rx.try_iter());
        self.consumers.retain(|link| {
            let alive = link.is_alive();
            if !alive {
                tracing::debug!("Removing consumer {}", link.peer);
            }
            alive
        });
    }
}

impl Outlet for TcpOutlet {
    fn wait_for_consumers(&mut self, timeout: Duration) -> bool {
        self.refresh_consumers();
        if !self.consumers.is_empty() {
            return true;
        }
        match self.link_rx.recv_timeout(timeout) {
            Ok(link) => {
                self.consumers.push(link);
                true
            }
            Err(_) => false,
        }
    }

    fn have_consumers(&mut self) -> bool {
        self.refresh_consumers();
        !self.consumers.is_empty()
    }

    fn push_sample(&mut self, sample: &[f32]) -> Result<()> {
        if sample.len() != self.channel_count {
            return Err(StreamError::Transport(format!(
                "Sample has {} channels, stream has {}",
                sample.len(),
                self.channel_count
            )));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.refresh_consumers();
        if self.consumers.is_empty() {
            return Ok(());
        }

        let frame: Arc<[u8]> = Arc::from(encode_frame(seq, sample));
        let mut dropped = 0;
        self.consumers
            .retain(|link| match link.frames.try_send(frame.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            });
        if dropped > 0 {
            self.dropped += dropped;
            tracing::debug!("Sample {} dropped for {} slow consumer(s)", seq, dropped);
        }
        Ok(())
    }
}

impl Drop for TcpOutlet {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.acceptor.take() {
            let _ = handle.join();
        }
    }
}

// ==================== Consumer ====================

/// Minimal client for a [`TcpOutlet`]
pub struct TcpConsumer {
    reader: BufReader<TcpStream>,
    info: StreamInfo,
}

impl TcpConsumer {
    /// Connect and read the stream header
    pub fn connect(addr: impl ToSocketAddrs, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(timeout))?;
        let mut reader = BufReader::new(stream);

        let mut line = String::new();
        reader.read_line(&mut line)?;
        let info: StreamInfo = serde_json::from_str(line.trim_end())?;
        Ok(Self { reader, info })
    }

    /// Stream descriptor sent by the outlet
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Read the next sample and its sequence number
    pub fn next_sample(&mut self) -> Result<(u64, Vec<f32>)> {
        let mut frame = vec![0u8; SEQ_BYTES + self.info.channel_count * 4];
        self.reader.read_exact(&mut frame)?;
        decode_frame(&frame, self.info.channel_count)
            .ok_or_else(|| StreamError::Transport("Malformed sample frame".to_string()))
    }
}
