//! The peer discovery sink.

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};
use veristake_types::KeyId;

/// Errors from peer file persistence.
///
/// Best-effort territory: callers log these and move on, the node never
/// fails over a peer file.
#[derive(Debug, Error)]
pub enum PeerFileError {
    /// No config path has been set.
    #[error("no peer config path configured")]
    NoPath,

    /// Reading or writing the peer file failed.
    #[error("peer file I/O at {path}: {source}")]
    Io {
        /// The peer file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Callback into the network layer that turns a discovered address into a
/// persistent peer connection.
pub trait PeerPromotionSink: Send + Sync {
    /// Add `address` as a persistent peer (the `addnode` operation).
    fn add_persistent_peer(&self, address: SocketAddr);
}

#[derive(Default)]
struct Inner {
    known: BTreeSet<SocketAddr>,
    pending_additions: BTreeSet<SocketAddr>,
    config_path: Option<PathBuf>,
}

/// Deduplicating sink for heartbeat-carried validator addresses.
///
/// Invariant: `pending_additions ⊆ known`. Persistence is idempotent;
/// loading a file produced by saving restores the same known set.
pub struct PeerDiscovery {
    inner: Mutex<Inner>,
}

impl Default for PeerDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerDiscovery {
    /// Create an empty sink with no config path.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Create a sink persisting to `path`, loading any existing file.
    ///
    /// A missing file is normal on first start; read errors are logged
    /// and an empty sink is returned.
    pub fn with_config_path(path: impl Into<PathBuf>) -> Self {
        let sink = Self::new();
        sink.set_config_path(path);
        if let Err(e) = sink.load_peers_from_config() {
            warn!(error = %e, "Could not load peer config, starting empty");
        }
        sink
    }

    /// Set the path used by [`save_peers_to_config`](Self::save_peers_to_config).
    pub fn set_config_path(&self, path: impl Into<PathBuf>) {
        self.inner.lock().config_path = Some(path.into());
    }

    /// Ingest a validated heartbeat address.
    ///
    /// Returns `true` when the address is new: it was added to the known
    /// set and queued for promotion to a persistent peer.
    pub fn process_validator_address(&self, address: SocketAddr, validator_id: &KeyId) -> bool {
        let mut inner = self.inner.lock();
        if !inner.known.insert(address) {
            return false;
        }
        inner.pending_additions.insert(address);
        info!(
            address = %address,
            validator = %validator_id,
            "Discovered new validator peer"
        );
        true
    }

    /// Addresses waiting for promotion to persistent peers.
    pub fn pending_peers(&self) -> Vec<SocketAddr> {
        self.inner.lock().pending_additions.iter().copied().collect()
    }

    /// Mark an address as promoted; it stays known so it is not
    /// re-announced by later heartbeats.
    pub fn mark_peer_added(&self, address: &SocketAddr) {
        self.inner.lock().pending_additions.remove(address);
    }

    /// Whether the address has been seen before.
    pub fn is_known_peer(&self, address: &SocketAddr) -> bool {
        self.inner.lock().known.contains(address)
    }

    /// Number of known validator peers.
    pub fn known_peer_count(&self) -> usize {
        self.inner.lock().known.len()
    }

    /// The `addnode` command string for an address.
    pub fn addnode_command(address: &SocketAddr) -> String {
        format!("addnode \"{address}\" add")
    }

    /// Write the known set to the config file.
    ///
    /// Format: one `addnode=ip:port` per line, with a comment header.
    /// Holds the sink's lock for the duration of the write; callers must
    /// tolerate the file I/O latency.
    pub fn save_peers_to_config(&self) -> Result<(), PeerFileError> {
        let inner = self.inner.lock();
        let path = inner.config_path.clone().ok_or(PeerFileError::NoPath)?;

        let io_err = |source| PeerFileError::Io {
            path: path.clone(),
            source,
        };

        let mut file = std::fs::File::create(&path).map_err(io_err)?;
        writeln!(file, "# VeriStake validator peers - auto-generated").map_err(io_err)?;
        writeln!(file, "# Discovered from validator heartbeats").map_err(io_err)?;
        writeln!(file, "# Format: addnode=IP:PORT").map_err(io_err)?;
        writeln!(file).map_err(io_err)?;
        for peer in &inner.known {
            writeln!(file, "addnode={peer}").map_err(io_err)?;
        }

        info!(peers = inner.known.len(), path = %path.display(), "Saved validator peers");
        Ok(())
    }

    /// Merge peers from the config file into the known set.
    ///
    /// Blank lines and `#` comments are skipped; unparsable addresses are
    /// logged and dropped. A missing file is not an error.
    pub fn load_peers_from_config(&self) -> Result<(), PeerFileError> {
        let mut inner = self.inner.lock();
        let path = inner.config_path.clone().ok_or(PeerFileError::NoPath)?;

        let file = match std::fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No peer config yet");
                return Ok(());
            }
            Err(source) => return Err(PeerFileError::Io { path, source }),
        };

        let mut loaded = 0usize;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| PeerFileError::Io {
                path: path.clone(),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(addr_str) = line.strip_prefix("addnode=") else {
                continue;
            };
            match addr_str.trim().parse::<SocketAddr>() {
                Ok(addr) => {
                    inner.known.insert(addr);
                    loaded += 1;
                }
                Err(e) => {
                    warn!(line = addr_str, error = %e, "Skipping unparsable peer line");
                }
            }
        }

        info!(loaded, path = %path.display(), "Loaded validator peers");
        Ok(())
    }

    /// The configured peer file path, if any.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.inner.lock().config_path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> SocketAddr {
        format!("203.0.113.{last}:18888").parse().unwrap()
    }

    fn validator() -> KeyId {
        KeyId::new([5u8; 20])
    }

    #[test]
    fn test_new_address_is_pending() {
        let sink = PeerDiscovery::new();
        assert!(sink.process_validator_address(addr(1), &validator()));
        assert!(sink.is_known_peer(&addr(1)));
        assert_eq!(sink.pending_peers(), vec![addr(1)]);

        // Second sighting is not new
        assert!(!sink.process_validator_address(addr(1), &validator()));
        assert_eq!(sink.known_peer_count(), 1);
    }

    #[test]
    fn test_mark_added_keeps_known() {
        let sink = PeerDiscovery::new();
        sink.process_validator_address(addr(1), &validator());
        sink.mark_peer_added(&addr(1));

        assert!(sink.pending_peers().is_empty());
        assert!(sink.is_known_peer(&addr(1)));
        // Pending is always a subset of known
        assert!(!sink.process_validator_address(addr(1), &validator()));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validator_peers.conf");

        let sink = PeerDiscovery::new();
        sink.set_config_path(&path);
        for last in [3, 1, 2] {
            sink.process_validator_address(addr(last), &validator());
        }
        sink.save_peers_to_config().unwrap();

        let restored = PeerDiscovery::with_config_path(&path);
        assert_eq!(restored.known_peer_count(), 3);
        for last in [1, 2, 3] {
            assert!(restored.is_known_peer(&addr(last)));
        }
        // Loaded peers are known but not pending
        assert!(restored.pending_peers().is_empty());
    }

    #[test]
    fn test_save_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peers.conf");

        let sink = PeerDiscovery::new();
        sink.set_config_path(&path);
        sink.process_validator_address(addr(1), &validator());
        sink.save_peers_to_config().unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        sink.save_peers_to_config().unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_tolerates_comments_and_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peers.conf");
        std::fs::write(
            &path,
            "# header\n\naddnode=203.0.113.1:18888\nnot-a-directive\naddnode=bogus\n  addnode=203.0.113.2:18888  \n",
        )
        .unwrap();

        let sink = PeerDiscovery::with_config_path(&path);
        assert_eq!(sink.known_peer_count(), 2);
        assert!(sink.is_known_peer(&addr(1)));
        assert!(sink.is_known_peer(&addr(2)));
    }

    #[test]
    fn test_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PeerDiscovery::new();
        sink.set_config_path(dir.path().join("absent.conf"));
        sink.load_peers_from_config().unwrap();
        assert_eq!(sink.known_peer_count(), 0);
    }

    #[test]
    fn test_no_path_errors() {
        let sink = PeerDiscovery::new();
        assert!(matches!(
            sink.save_peers_to_config(),
            Err(PeerFileError::NoPath)
        ));
    }

    #[test]
    fn test_addnode_command() {
        assert_eq!(
            PeerDiscovery::addnode_command(&addr(1)),
            "addnode \"203.0.113.1:18888\" add"
        );
    }
}
