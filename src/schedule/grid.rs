use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime, Timelike};

use super::slot::{SlotError, SlotKey, slot_range, time_slots};

/// Days-by-half-hours shape of an event's grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    dates: Vec<NaiveDate>,
    start_hour: u32,
    end_hour: u32,
}

impl GridLayout {
    pub fn new(dates: Vec<NaiveDate>, start_hour: u32, end_hour: u32) -> Self {
        Self {
            dates,
            start_hour,
            end_hour,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    /// Row start times, top to bottom.
    pub fn rows(&self) -> Vec<NaiveTime> {
        time_slots(self.start_hour, self.end_hour)
    }

    pub fn slots_on(&self, date: NaiveDate) -> Vec<SlotKey> {
        self.rows()
            .into_iter()
            .filter_map(|time| SlotKey::new(date, time).ok())
            .collect()
    }

    /// All slot keys in the grid, ordered by date then time.
    pub fn slot_keys(&self) -> Vec<SlotKey> {
        self.dates.iter().flat_map(|d| self.slots_on(*d)).collect()
    }

    pub fn contains(&self, key: &SlotKey) -> bool {
        let hour = key.time().hour();
        self.dates.contains(&key.date()) && hour >= self.start_hour && hour < self.end_hour
    }

    /// Resolves a (column, row) cell position to its key.
    pub fn cell(&self, column: usize, row: usize) -> Option<SlotKey> {
        let date = *self.dates.get(column)?;
        let time = *self.rows().get(row)?;
        SlotKey::new(date, time).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragDirection {
    Add,
    Remove,
}

/// The current user's unavailable slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSelection {
    slots: BTreeSet<SlotKey>,
}

impl SlotSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &SlotKey) -> bool {
        self.slots.contains(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotKey> {
        self.slots.iter()
    }

    pub fn to_vec(&self) -> Vec<SlotKey> {
        self.slots.iter().cloned().collect()
    }

    /// Returns true when the selection changed.
    pub fn apply(&mut self, direction: DragDirection, key: SlotKey) -> bool {
        match direction {
            DragDirection::Add => self.slots.insert(key),
            DragDirection::Remove => self.slots.remove(&key),
        }
    }

    pub fn toggle(&mut self, key: SlotKey) {
        if !self.slots.remove(&key) {
            self.slots.insert(key);
        }
    }

    pub fn remove(&mut self, key: &SlotKey) -> bool {
        self.slots.remove(key)
    }

    /// Adds every slot in `[start, end)` on `date`.
    pub fn add_range(&mut self, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<usize, SlotError> {
        let before = self.slots.len();
        self.slots.extend(slot_range(date, start, end)?);
        Ok(self.slots.len() - before)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn replace(&mut self, slots: impl IntoIterator<Item = SlotKey>) {
        self.slots = slots.into_iter().collect();
    }
}

impl FromIterator<SlotKey> for SlotSelection {
    fn from_iter<T: IntoIterator<Item = SlotKey>>(iter: T) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Gesture {
    Idle,
    Dragging {
        direction: DragDirection,
        last: SlotKey,
    },
}

/// Drag-to-paint selection surface.
///
/// A press fixes the gesture direction from the pressed cell's current
/// membership; every cell entered afterwards is forced to that state until
/// release.
#[derive(Debug, Clone)]
pub struct SlotGrid {
    layout: GridLayout,
    selection: SlotSelection,
    gesture: Gesture,
}

impl SlotGrid {
    pub fn new(layout: GridLayout, selection: SlotSelection) -> Self {
        Self {
            layout,
            selection,
            gesture: Gesture::Idle,
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn selection(&self) -> &SlotSelection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SlotSelection {
        &mut self.selection
    }

    pub fn into_selection(self) -> SlotSelection {
        self.selection
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn direction(&self) -> Option<DragDirection> {
        match self.gesture {
            Gesture::Dragging { direction, .. } => Some(direction),
            Gesture::Idle => None,
        }
    }

    /// Starts a gesture on `key`. Returns true when the selection changed.
    pub fn press(&mut self, key: SlotKey) -> bool {
        if !self.layout.contains(&key) {
            return false;
        }
        let direction = if self.selection.contains(&key) {
            DragDirection::Remove
        } else {
            DragDirection::Add
        };
        self.gesture = Gesture::Dragging {
            direction,
            last: key.clone(),
        };
        self.selection.apply(direction, key)
    }

    /// Pointer moved over `key`; `None` when nothing under the pointer is a cell.
    pub fn move_over(&mut self, key: Option<SlotKey>) -> bool {
        let Gesture::Dragging { direction, last } = &mut self.gesture else {
            return false;
        };
        let Some(key) = key else {
            return false;
        };
        if *last == key || !self.layout.contains(&key) {
            return false;
        }
        *last = key.clone();
        self.selection.apply(*direction, key)
    }

    pub fn release(&mut self) {
        self.gesture = Gesture::Idle;
    }

    pub fn cancel(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn key(s: &str) -> SlotKey {
        SlotKey::parse(s).unwrap()
    }

    fn grid() -> SlotGrid {
        let layout = GridLayout::new(vec![day(), day().succ_opt().unwrap()], 9, 12);
        SlotGrid::new(layout, SlotSelection::new())
    }

    #[test]
    fn test_layout_bounds() {
        let layout = GridLayout::new(vec![day()], 9, 11);
        assert_eq!(layout.slot_keys().len(), 4);
        assert!(layout.contains(&key("2024-05-20T10:30:00")));
        assert!(!layout.contains(&key("2024-05-20T11:00:00")));
        assert!(!layout.contains(&key("2024-05-20T08:30:00")));
        assert!(!layout.contains(&key("2024-05-21T09:00:00")));
        assert_eq!(layout.cell(0, 1), Some(key("2024-05-20T09:30:00")));
        assert_eq!(layout.cell(1, 0), None);
    }

    #[test]
    fn test_press_adds_then_drag_adds() {
        let mut grid = grid();
        assert!(grid.press(key("2024-05-20T09:00:00")));
        assert_eq!(grid.direction(), Some(DragDirection::Add));
        assert!(grid.move_over(Some(key("2024-05-20T09:30:00"))));
        assert!(grid.move_over(Some(key("2024-05-21T09:30:00"))));
        grid.release();
        assert!(!grid.is_dragging());
        assert_eq!(grid.selection().len(), 3);
    }

    #[test]
    fn test_press_on_selected_removes() {
        let mut grid = grid();
        grid.selection_mut().replace([
            key("2024-05-20T09:00:00"),
            key("2024-05-20T09:30:00"),
            key("2024-05-20T10:00:00"),
        ]);
        grid.press(key("2024-05-20T09:30:00"));
        assert_eq!(grid.direction(), Some(DragDirection::Remove));
        grid.move_over(Some(key("2024-05-20T10:00:00")));
        // Entering an unselected cell while removing leaves it unselected.
        assert!(!grid.move_over(Some(key("2024-05-20T10:30:00"))));
        grid.release();
        assert_eq!(grid.selection().to_vec(), vec![key("2024-05-20T09:00:00")]);
    }

    #[test]
    fn test_revisiting_cells_is_idempotent() {
        let path = [
            "2024-05-20T09:00:00",
            "2024-05-20T09:30:00",
            "2024-05-20T09:00:00",
            "2024-05-20T09:30:00",
            "2024-05-20T10:00:00",
            "2024-05-20T09:30:00",
        ];
        let mut noisy = grid();
        noisy.press(key(path[0]));
        for k in &path[1..] {
            noisy.move_over(Some(key(k)));
        }
        noisy.release();

        let mut once = grid();
        once.press(key("2024-05-20T09:00:00"));
        once.move_over(Some(key("2024-05-20T09:30:00")));
        once.move_over(Some(key("2024-05-20T10:00:00")));
        once.release();

        assert_eq!(noisy.selection(), once.selection());
    }

    #[test]
    fn test_moves_off_grid_are_ignored() {
        let mut grid = grid();
        assert!(!grid.move_over(Some(key("2024-05-20T09:00:00"))));
        grid.press(key("2024-05-20T09:00:00"));
        assert!(!grid.move_over(None));
        assert!(!grid.move_over(Some(key("2024-05-20T20:00:00"))));
        assert!(!grid.press(key("2024-06-01T09:00:00")));
        grid.cancel();
        assert_eq!(grid.selection().len(), 1);
    }

    #[test]
    fn test_add_range_and_toggle() {
        let mut selection = SlotSelection::new();
        let added = selection
            .add_range(
                day(),
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            )
            .unwrap();
        assert_eq!(added, 3);
        selection.toggle(key("2024-05-20T09:30:00"));
        assert!(!selection.contains(&key("2024-05-20T09:30:00")));
        selection.toggle(key("2024-05-20T09:30:00"));
        assert_eq!(selection.len(), 3);

        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        assert!(matches!(
            selection.add_range(day(), ten, ten),
            Err(SlotError::EmptyRange { .. })
        ));
        assert_eq!(selection.len(), 3);
    }
}
