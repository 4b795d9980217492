use crate::hex;
use anyhow::Result;
use std::sync::Arc;

pub const PALETTE_KEY: &str = "ultimatergb_palette";
pub const DEFAULT_CAPACITY: usize = 18;

pub const DEFAULT_PALETTE: [&str; 10] = [
    "#FF6B6B", "#FFD166", "#06D6A0", "#118AB2", "#8A5CF6", "#F72585", "#3A0CA3", "#4CC9F0",
    "#2A9D8F", "#E76F51",
];

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: String) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    entries: Vec<String>,
    capacity: usize,
}

impl Palette {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn defaults(capacity: usize) -> Self {
        Self::with_entries(DEFAULT_PALETTE.iter().map(|s| s.to_string()), capacity)
    }

    // Builds a palette from stored entries, keeping their order. Invalid
    // and duplicate entries are skipped; the tail beyond capacity is cut.
    pub fn with_entries<I>(entries: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut palette = Self::new(capacity);
        for entry in entries {
            let Some(canonical) = hex::normalize(&entry) else {
                crate::log_warn!("Skipping invalid palette entry {:?}", entry);
                continue;
            };
            if !palette.entries.contains(&canonical) {
                palette.entries.push(canonical);
            }
        }
        palette.entries.truncate(palette.capacity);
        palette
    }

    pub fn add(&mut self, hex: &str) -> bool {
        let Some(canonical) = hex::normalize(hex) else {
            return false;
        };
        if self.entries.contains(&canonical) {
            return false;
        }
        self.entries.insert(0, canonical);
        self.entries.truncate(self.capacity);
        true
    }

    pub fn remove(&mut self, hex: &str) -> bool {
        let target = hex::normalize(hex).unwrap_or_else(|| hex.to_string());
        let before = self.entries.len();
        self.entries.retain(|entry| *entry != target);
        self.entries.len() != before
    }

    pub fn contains(&self, hex: &str) -> bool {
        hex::normalize(hex).is_some_and(|canonical| self.entries.contains(&canonical))
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

pub struct PaletteStore {
    palette: Palette,
    store: Arc<dyn KeyValueStore>,
}

impl PaletteStore {
    pub fn load(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        let palette = match store.get(PALETTE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<String>>(&json) {
                Ok(entries) => Palette::with_entries(entries, capacity),
                Err(e) => {
                    crate::log_warn!("Saved palette is corrupt ({}), using defaults", e);
                    Palette::defaults(capacity)
                }
            },
            Ok(None) => Palette::defaults(capacity),
            Err(e) => {
                crate::log_warn!("Failed to read saved palette: {:#}", e);
                Palette::defaults(capacity)
            }
        };

        let loaded = Self { palette, store };
        loaded.persist();
        loaded
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn add(&mut self, hex: &str) -> bool {
        let changed = self.palette.add(hex);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn remove(&mut self, hex: &str) -> bool {
        let changed = self.palette.remove(hex);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn persist(&self) -> bool {
        let json = match serde_json::to_string(self.palette.entries()) {
            Ok(json) => json,
            Err(e) => {
                crate::log_error!("Failed to serialize palette: {}", e);
                return false;
            }
        };
        match self.store.set(PALETTE_KEY, json) {
            Ok(()) => true,
            Err(e) => {
                crate::log_warn!("Failed to persist palette: {:#}", e);
                false
            }
        }
    }
}
