//! Chinba availability core: slots, the drag-selection grid, heatmap
//! aggregation and free-time extraction.

pub mod freetime;
pub mod grid;
pub mod heatmap;
pub mod slot;

pub use freetime::{FreeWindow, free_windows, recommend};
pub use grid::{DragDirection, GridLayout, SlotGrid, SlotSelection};
pub use heatmap::{Heatmap, ParticipantAvailability, Severity, TooltipState};
pub use slot::{SlotError, SlotKey};
