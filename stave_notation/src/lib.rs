// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stave Notation: western notation layout on top of the Stave scene graph.
//!
//! - [`Duration`]: metered note values and their flag and dot counts.
//! - [`resolve_beams`] and [`resolve_beam_layout`]: which beam positions need hooks and
//!   which beam segments a group draws at each depth.
//! - [`BeamGroup`]: the beam pre-pass. It picks a beam direction and slope from the
//!   group's [`Chord`]s, rewrites their stems and creates one spanner node per beam.
//! - [`Staff`] with its [`Clef`], [`KeySignature`] and [`TimeSignature`] objects.
//! - [`StaffGroup`]: aligns the fringes (clef, key and time signature area at the start of
//!   each line) of grouped staves and registers the margins they need.
//! - [`InstrumentName`]: names written left of each line's fringe, on their own margin layer.
//! - [`Slur`], [`Tie`], [`Hairpin`], [`OctaveLine`] and [`PedalLine`]: spanners drawn as one
//!   path, sliced per line by [`SpannerPath::slices`].
//!
//! Layout runs as a pre-pass. Build the scene, run [`BeamGroup::layout`],
//! [`StaffGroup::register_margin_controllers`] and
//! [`InstrumentName::register_margin_controllers`], then commit and render the scene.
//!
//! # Example
//!
//! ```rust
//! use stave_notation::{BeamConfig, BeamGroup, Chord, Duration, Staff, StaffConfig};
//! use stave_scene::Scene;
//! use stave_units::{Point, Unit};
//!
//! let mut scene = Scene::default();
//! let staff = Staff::insert(&mut scene, None, Point::ORIGIN, Unit::mm(100.0), StaffConfig::default())
//!     .unwrap();
//! let eighth = Duration::new(1, 8).unwrap();
//! let mut chords = vec![
//!     Chord::insert(&mut scene, &staff, Unit::mm(10.0), [staff.unit(3.0)], eighth).unwrap(),
//!     Chord::insert(&mut scene, &staff, Unit::mm(20.0), [staff.unit(2.5)], eighth).unwrap(),
//! ];
//! let group = BeamGroup::layout(&mut scene, &staff, &mut chords, &BeamConfig::default()).unwrap();
//! assert_eq!(group.beams().len(), 1);
//! assert!(chords.iter().all(|c| c.stem_end().is_some()));
//! ```

mod beam;
mod beam_group;
mod chord;
mod duration;
mod hairpin;
mod instrument_name;
mod octave_line;
mod path;
mod pedal_line;
mod slur;
mod staff;
mod staff_group;

pub use beam::{BeamHook, BeamPath, BeamSpec, BeamState, resolve_beam_layout, resolve_beams};
pub use beam_group::{
    Beam, BeamConfig, BeamDirection, BeamGroup, BeamLine, resolve_beam_direction,
    resolve_beam_line,
};
pub use chord::Chord;
pub use duration::{Duration, DurationDisplay};
pub use hairpin::{Hairpin, HairpinKind};
pub use instrument_name::{INSTRUMENT_NAME_LAYER, InstrumentName, NameText, TextMetrics};
pub use octave_line::{OctaveIndication, OctaveLine, OctaveMark};
pub use path::{PathSlice, SpannerPath};
pub use pedal_line::PedalLine;
pub use slur::{ArcConfig, Slur, Tie, VerticalDirection};
pub use staff::{
    Clef, FringeConfig, KeySignature, Staff, StaffConfig, StaffFringeLayout, TimeSignature,
    isolated_fringe_layout,
};
pub use staff_group::{STAFF_FRINGE_LAYER, StaffGroup, StaffSegment};

use stave_scene::{NodeId, SceneError};
use stave_units::{Unit, UnitError};

/// Errors reported by notation layout.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum NotationError {
    /// A duration had a zero part or a denominator that is not a power of two.
    #[error("invalid duration {numerator}/{denominator}")]
    InvalidDuration {
        /// The rejected numerator.
        numerator: u32,
        /// The rejected denominator.
        denominator: u32,
    },
    /// Beam groups need at least two members.
    #[error("beam groups need at least 2 members, got {0}")]
    TooFewBeamMembers(usize),
    /// A beam position has an unusable flag count or break depth.
    #[error("beam position {index}: {reason}")]
    InvalidBeamSpec {
        /// Index of the offending position.
        index: usize,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// A staff was configured with no lines or a non-positive line spacing.
    #[error("invalid staff: {0}")]
    InvalidStaff(&'static str),
    /// The node is not a staff of the group.
    #[error("node {0} is not a staff in this group")]
    UnknownStaff(NodeId),
    /// A pedal line half-lift too close to the line's end, measured from its start.
    #[error("half lift at {0} leaves no room before the pedal line's end")]
    InvalidHalfLift(Unit),
    /// A flowable line index past the flowable's last line.
    #[error("flowable has no line {0}")]
    NoSuchLine(usize),
    /// A unit could not be constructed.
    #[error(transparent)]
    Unit(#[from] UnitError),
    /// A scene operation failed.
    #[error(transparent)]
    Scene(#[from] SceneError),
}
