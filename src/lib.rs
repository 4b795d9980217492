pub mod clipboard;
pub mod color;
pub mod hex;
pub mod logger;
pub mod mapper;
pub mod palette;
pub mod picker;
pub mod state;
pub mod variations;

pub use clipboard::{ClipboardService, CopyOutcome, CopyTarget};
pub use color::{Hsva, Rgb, Rgba};
pub use hex::HexInput;
pub use logger::*;
pub use mapper::{Bounds, Control, Pointer};
pub use palette::{KeyValueStore, Palette};
pub use picker::{Picker, PickerOptions};
pub use state::{MemoryStore, StateManager};
