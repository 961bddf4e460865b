//! Duration presets shown on the cube faces.
//!
//! Faces are plain configuration: selecting one is shorthand for "stop the
//! current run, then start this duration" (see
//! [`TimerController::select_face`](crate::control::TimerController::select_face)).
//! Faces are grouped into interchangeable mode sets. The companion watch
//! keeps its own preset list, which may disagree with the phone's.

use serde::{Deserialize, Serialize};

use crate::types::TimerRecord;

/// Face id of the user-editable preset in the Focus set.
pub const CUSTOM_FACE_ID: u8 = 3;

// ============================================================================
// CubeMode
// ============================================================================

/// Interchangeable preset sets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CubeMode {
    #[default]
    Focus,
    Gym,
    Meditation,
}

impl CubeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CubeMode::Focus => "Focus",
            CubeMode::Gym => "Gym",
            CubeMode::Meditation => "Meditation",
        }
    }

    pub fn all() -> [CubeMode; 3] {
        [CubeMode::Focus, CubeMode::Gym, CubeMode::Meditation]
    }
}

// ============================================================================
// CubeFace
// ============================================================================

/// A named duration preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeFace {
    pub id: u8,
    pub name: String,
    pub color: String,
    /// Duration in seconds
    pub duration: f64,
}

impl CubeFace {
    pub fn new(id: u8, name: impl Into<String>, color: impl Into<String>, duration: f64) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            duration,
        }
    }
}

fn face(id: u8, name: &str, color: &str, duration: f64) -> CubeFace {
    CubeFace::new(id, name, color, duration)
}

/// Presets for one mode, in face-id order.
pub fn faces_for_mode(mode: CubeMode) -> Vec<CubeFace> {
    match mode {
        CubeMode::Focus => vec![
            face(0, "Focus", "cyan", 25.0 * 60.0),
            face(1, "Short Break", "green", 5.0 * 60.0),
            face(2, "Long Break", "blue", 15.0 * 60.0),
            face(CUSTOM_FACE_ID, "Custom", "yellow", 10.0 * 60.0),
            face(4, "Deep Work", "purple", 60.0 * 60.0),
            face(5, "Energy", "orange", 30.0 * 60.0),
        ],
        CubeMode::Gym => vec![
            face(0, "HIIT", "red", 45.0),
            face(1, "Rest", "orange", 60.0),
            face(2, "Heavy Rest", "yellow", 90.0),
            face(3, "Recovery", "green", 2.0 * 60.0),
            face(4, "Quick Rest", "cyan", 30.0),
            face(5, "Max Break", "purple", 3.0 * 60.0),
        ],
        CubeMode::Meditation => vec![
            face(0, "Grounding", "brown", 5.0 * 60.0),
            face(1, "Clarity", "teal", 15.0 * 60.0),
            face(2, "Zen", "purple", 30.0 * 60.0),
            face(3, "Deep Dive", "indigo", 20.0 * 60.0),
            face(4, "Breathe", "mint", 3.0 * 60.0),
            face(5, "Mindfulness", "blue", 10.0 * 60.0),
        ],
    }
}

/// The companion watch's own presets.
pub fn watch_faces() -> Vec<CubeFace> {
    vec![
        face(0, "Focus", "red", 25.0 * 60.0),
        face(1, "Short", "green", 5.0 * 60.0),
        face(2, "Long", "blue", 15.0 * 60.0),
        face(3, "Deep", "purple", 45.0 * 60.0),
        face(4, "Quick", "orange", 10.0 * 60.0),
        face(5, "Hour", "cyan", 60.0 * 60.0),
    ]
}

// ============================================================================
// FaceCatalog
// ============================================================================

/// The faces currently on the cube plus the selected one.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceCatalog {
    mode: CubeMode,
    faces: Vec<CubeFace>,
    selected: Option<u8>,
}

impl Default for FaceCatalog {
    fn default() -> Self {
        Self::new(CubeMode::default())
    }
}

impl FaceCatalog {
    #[must_use]
    pub fn new(mode: CubeMode) -> Self {
        Self {
            mode,
            faces: faces_for_mode(mode),
            selected: None,
        }
    }

    pub fn mode(&self) -> CubeMode {
        self.mode
    }

    pub fn faces(&self) -> &[CubeFace] {
        &self.faces
    }

    pub fn selected(&self) -> Option<&CubeFace> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: u8) -> Option<&CubeFace> {
        self.faces.iter().find(|f| f.id == id)
    }

    /// Finds a face by name, ignoring case and surrounding whitespace.
    pub fn find_by_name(&self, name: &str) -> Option<&CubeFace> {
        let name = name.trim();
        self.faces
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Finds the first face whose duration matches `seconds`.
    pub fn find_by_duration(&self, seconds: f64) -> Option<&CubeFace> {
        self.faces
            .iter()
            .find(|f| (f.duration - seconds).abs() < 1e-6)
    }

    /// Marks `id` as the selected face. Returns the face if it exists.
    pub fn select(&mut self, id: u8) -> Option<&CubeFace> {
        if self.get(id).is_some() {
            self.selected = Some(id);
        }
        self.selected()
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Swaps in another preset set and clears the selection.
    ///
    /// The caller is expected to stop any running timer.
    pub fn change_mode(&mut self, mode: CubeMode) {
        self.mode = mode;
        self.faces = faces_for_mode(mode);
        self.selected = None;
    }

    /// Sets the custom face's duration.
    ///
    /// Returns the updated face when it is the selected one, in which case
    /// the caller should restart it with the new duration. Only the Focus
    /// set has a custom face; other modes are left untouched.
    pub fn update_custom_duration(&mut self, minutes: u32) -> Option<CubeFace> {
        if self.mode != CubeMode::Focus {
            return None;
        }
        let custom = self.faces.iter_mut().find(|f| f.id == CUSTOM_FACE_ID)?;
        custom.duration = f64::from(minutes) * 60.0;
        let custom = custom.clone();

        (self.selected == Some(CUSTOM_FACE_ID)).then_some(custom)
    }

    /// Re-selects the face matching an active record's configured duration.
    ///
    /// Idle records clear the selection.
    pub fn restore_from(&mut self, record: &TimerRecord) -> Option<&CubeFace> {
        self.selected = match (record.state.is_active(), record.original_duration) {
            (true, Some(duration)) => self.find_by_duration(duration).map(|f| f.id),
            _ => None,
        };
        self.selected()
    }
}

// ============================================================================
// Tests
// ============================================================================
