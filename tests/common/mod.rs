#![allow(dead_code)]

use anyhow::{Result, anyhow};
use graphlink::{
    ClientFactory, ConnectionConfig, ConnectionOptions, ConnectionSet, OptionValue, SdkSource,
};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Client produced by [`RecordingFactory`]
#[derive(Debug, PartialEq)]
pub struct TestClient {
    pub serial: usize,
    pub options: ConnectionOptions,
}

/// Factory that records every construction. Clones share their records.
#[derive(Clone, Default)]
pub struct RecordingFactory {
    state: Arc<Records>,
}

#[derive(Default)]
struct Records {
    constructed: AtomicUsize,
    seen: Mutex<Vec<ConnectionOptions>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constructed(&self) -> usize {
        self.state.constructed.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<ConnectionOptions> {
        self.state.seen.lock().unwrap().clone()
    }
}

impl ClientFactory for RecordingFactory {
    type Client = TestClient;

    fn construct(&self, options: &ConnectionOptions) -> Result<TestClient> {
        if let Some(OptionValue::String(secret)) = options.get("secret") {
            if secret == "reject" {
                return Err(anyhow!("Invalid OAuth access token"));
            }
        }

        let serial = self.state.constructed.fetch_add(1, Ordering::SeqCst);
        self.state.seen.lock().unwrap().push(options.clone());
        Ok(TestClient {
            serial,
            options: options.clone(),
        })
    }
}

/// SDK source handing out a shared [`RecordingFactory`] and counting loads
pub struct RecordingSource {
    pub factory: RecordingFactory,
    pub loads: Arc<AtomicUsize>,
}

pub const ENTRY_FILE: &str = "sdk.entry";

impl SdkSource for RecordingSource {
    type Factory = RecordingFactory;

    fn entry_file(&self) -> PathBuf {
        PathBuf::from(ENTRY_FILE)
    }

    fn load(&self, _entry: &Path) -> Result<RecordingFactory> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.factory.clone())
    }
}

/// A temporary SDK directory containing the entry file
pub fn sdk_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(ENTRY_FILE), b"sdk").unwrap();
    dir
}

pub fn options(pairs: &[(&str, &str)]) -> ConnectionOptions {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), OptionValue::from(*value)))
        .collect()
}

pub fn connections(entries: &[(&str, ConnectionOptions)]) -> ConnectionSet {
    entries
        .iter()
        .map(|(key, options)| (key.to_string(), ConnectionConfig::new(options.clone())))
        .collect()
}

/// Build the fixture SDK library once per test binary and return the directory holding it
pub fn sdk_fixture_dir() -> &'static Path {
    static FIXTURE_DIR: OnceLock<PathBuf> = OnceLock::new();

    FIXTURE_DIR.get_or_init(|| {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let manifest = root.join("tests/fixtures/graph-sdk/Cargo.toml");
        let target_dir = root.join("target/graph-sdk-fixture");

        let output = Command::new(env!("CARGO"))
            .arg("build")
            .arg("--manifest-path")
            .arg(&manifest)
            .arg("--target-dir")
            .arg(&target_dir)
            .env("CARGO_NET_OFFLINE", "true")
            .output()
            .expect("run cargo build for the SDK fixture");
        assert!(
            output.status.success(),
            "SDK fixture build failed:\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        let dir = target_dir.join("debug");
        assert!(
            dir.join(libloading::library_filename("graph_sdk")).is_file(),
            "SDK fixture library missing in {}",
            dir.display()
        );
        dir
    })
}
