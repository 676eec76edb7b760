#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use telemstore::{Datastore, StoreOptions};

/// Three channels, most values missing, every channel silent on the first
/// line except `A`.
pub const SPARSE_LOG: &str = "\"A\"|\"u\"|0|10|1,\"B\"|\"u\"|0|10|1,\"C\"|\"u\"|0|10|1
1,,
2,,
3,5,
4,,9
5,6,
";

/// A 50 Hz log with a 10 Hz channel, already in export column order so an
/// import/export round trip reproduces it byte for byte.
pub const RATED_LOG: &str = "\"Interval\"|\"ms\"|0|0|50,\"Utc\"|\"ms\"|0|0|50,\"Coolant\"|\"F\"|0|300|10,\"RPM\"|\"rpm\"|0|10000|50
0,1000,180,5000
20,1020,,5100
40,1040,,5200
60,1060,,5300
80,1080,,5400
100,1100,181,5500
120,1120,,5600
140,1140,,5700
160,1160,,5800
180,1180,,5900
";

/// Two timed laps followed by an out lap.
pub const LAP_LOG: &str = "\"Interval\"|\"ms\"|0|0|1,\"LapCount\"|\"\"|0|10|1,\"CurrentLap\"|\"\"|0|10|1,\"LapTime\"|\"min\"|0|5|1
0,0,1,
1000,0,1,
2000,1,2,1.5
3000,1,2,
4000,2,3,1.4
5000,2,3,
";

/// Scratch directory holding the database, datalogs and a fake HOME so the
/// CLI never touches the real configuration.
pub struct Scratch {
    pub dir: TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn db(&self) -> String {
        self.path("telemstore_test.sqlite")
            .to_string_lossy()
            .to_string()
    }

    /// Write `contents` to `name` inside the scratch dir and return its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let p = self.path(name);
        fs::write(&p, contents).expect("write scratch file");
        p
    }

    pub fn store(&self) -> Datastore {
        Datastore::open(self.db(), StoreOptions::default()).expect("open store")
    }

    /// `telemstore --db <scratch db>` with HOME pointed at the scratch dir.
    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("telemstore");
        cmd.env("HOME", self.dir.path())
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("RUST_LOG")
            .args(["--db", &self.db()]);
        cmd
    }
}
