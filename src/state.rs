use crate::color::Hsva;
use crate::palette::{KeyValueStore, DEFAULT_CAPACITY};
use anyhow::{Context, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

const SCHEMA_VERSION: i32 = 1;
const APP_STATE_KEY: &str = "app_state";
const APP_DIR_NAME: &str = "UltimateRGB";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default = "default_palette_capacity")]
    pub palette_capacity: usize,
    #[serde(default = "default_log_retention")]
    pub log_retention_count: usize,
    #[serde(default = "default_copy_feedback_ms")]
    pub copy_feedback_ms: u64,
    #[serde(default = "default_show_background")]
    pub show_background: bool,
    #[serde(default)]
    pub last_color: Option<Hsva>,
    #[serde(default = "default_window_size")]
    pub window_size: [f32; 2],
}

fn default_palette_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_log_retention() -> usize {
    10
}

fn default_copy_feedback_ms() -> u64 {
    1400
}

fn default_show_background() -> bool {
    true
}

fn default_window_size() -> [f32; 2] {
    [980.0, 720.0]
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            palette_capacity: default_palette_capacity(),
            log_retention_count: default_log_retention(),
            copy_feedback_ms: default_copy_feedback_ms(),
            show_background: default_show_background(),
            last_color: None,
            window_size: default_window_size(),
        }
    }
}

pub fn default_app_data_dir() -> Result<PathBuf> {
    let base = std::env::var_os("APPDATA")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("XDG_DATA_HOME").map(PathBuf::from))
        .or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("share"))
        })
        .context("Failed to locate an app data directory (APPDATA, XDG_DATA_HOME, HOME)")?;

    Ok(base.join(APP_DIR_NAME))
}

enum WriteCommand {
    Put(String, String),
    Flush(Sender<()>),
    Shutdown,
}

// SQLite key-value store with an in-memory cache. Reads hit the cache;
// writes update it and go to disk on a background thread.
pub struct StateManager {
    app_data_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
    app_state: RwLock<AppState>,
    write_sender: Sender<WriteCommand>,
    write_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl StateManager {
    pub fn new() -> Result<Self> {
        Self::open(default_app_data_dir()?)
    }

    pub fn open(app_data_dir: impl Into<PathBuf>) -> Result<Self> {
        let app_data_dir = app_data_dir.into();
        let db_path = app_data_dir.join("state.db");

        std::fs::create_dir_all(&app_data_dir)
            .context("Failed to create app data directory")?;

        let conn = Connection::open(&db_path).context("Failed to open database")?;
        Self::init_database(&conn)?;

        let cache = Self::load_entries(&conn)?;
        let app_state = Self::parse_app_state(cache.get(APP_STATE_KEY));

        let (write_sender, write_receiver): (Sender<WriteCommand>, Receiver<WriteCommand>) =
            unbounded();

        let db_path_clone = db_path.clone();
        let write_thread = thread::spawn(move || {
            Self::write_worker(db_path_clone, write_receiver);
        });

        Ok(Self {
            app_data_dir,
            cache: Arc::new(RwLock::new(cache)),
            app_state: RwLock::new(app_state),
            write_sender,
            write_thread: Mutex::new(Some(write_thread)),
        })
    }

    fn init_database(conn: &Connection) -> Result<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
            .ok();

        if current_version.is_none() {
            conn.execute("INSERT INTO schema_version (version) VALUES (?1)", params![SCHEMA_VERSION])?;
        }

        Ok(())
    }

    fn load_entries(conn: &Connection) -> Result<HashMap<String, String>> {
        let mut stmt = conn
            .prepare("SELECT key, value FROM state")
            .context("Failed to read state table")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut entries = HashMap::new();
        for row in rows {
            match row {
                Ok((key, value)) => {
                    entries.insert(key, value);
                }
                Err(e) => crate::log_warn!("Skipping unreadable state row: {}", e),
            }
        }
        Ok(entries)
    }

    fn parse_app_state(json: Option<&String>) -> AppState {
        let Some(json) = json else {
            return AppState::default();
        };
        match serde_json::from_str::<AppState>(json) {
            Ok(state) => state,
            Err(e) => {
                crate::log_warn!("Saved settings are corrupt ({}), using defaults", e);
                AppState::default()
            }
        }
    }

    fn write_worker(db_path: PathBuf, receiver: Receiver<WriteCommand>) {
        let conn = match Connection::open(&db_path) {
            Ok(c) => c,
            Err(e) => {
                crate::log_error!("Failed to open database in write worker: {}", e);
                // Keep answering flushes so callers never block on a dead writer.
                while let Ok(cmd) = receiver.recv() {
                    match cmd {
                        WriteCommand::Flush(done) => {
                            let _ = done.send(());
                        }
                        WriteCommand::Put(..) => {}
                        WriteCommand::Shutdown => break,
                    }
                }
                return;
            }
        };

        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "synchronous", "NORMAL");

        while let Ok(cmd) = receiver.recv() {
            match cmd {
                WriteCommand::Put(key, value) => {
                    if let Err(e) = conn.execute(
                        "INSERT OR REPLACE INTO state (key, value) VALUES (?1, ?2)",
                        params![key, value],
                    ) {
                        crate::log_error!("Failed to write state key {}: {}", key, e);
                    }
                }
                WriteCommand::Flush(done) => {
                    let _ = done.send(());
                }
                WriteCommand::Shutdown => {
                    break;
                }
            }
        }

        let _ = conn.pragma_update(None, "wal_checkpoint", "TRUNCATE");
    }

    pub fn app_data_dir(&self) -> &Path {
        &self.app_data_dir
    }

    pub fn log_dir(&self) -> PathBuf {
        self.app_data_dir.join("logs")
    }

    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        f(&self.app_state.read())
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut AppState),
    {
        let snapshot = {
            let mut state = self.app_state.write();
            let before = state.clone();
            f(&mut state);
            if *state == before {
                return;
            }
            state.clone()
        };

        match serde_json::to_string(&snapshot) {
            Ok(json) => {
                if let Err(e) = self.set(APP_STATE_KEY, json) {
                    crate::log_warn!("Failed to persist settings: {:#}", e);
                }
            }
            Err(e) => crate::log_error!("Failed to serialize settings: {}", e),
        }
    }

    pub fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = bounded(1);
        self.write_sender
            .send(WriteCommand::Flush(done_tx))
            .context("State writer has stopped")?;
        done_rx.recv().context("State writer stopped before flushing")?;
        Ok(())
    }
}

impl KeyValueStore for StateManager {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.cache.write().insert(key.to_string(), value.clone());
        self.write_sender
            .send(WriteCommand::Put(key.to_string(), value))
            .context("State writer has stopped")?;
        Ok(())
    }
}

impl Drop for StateManager {
    fn drop(&mut self) {
        let _ = self.write_sender.send(WriteCommand::Shutdown);
        if let Some(handle) = self.write_thread.lock().take() {
            let _ = handle.join();
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }
}
