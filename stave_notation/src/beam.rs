// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Beam hook and beam path resolution.
//!
//! A beam group is described by one [`BeamSpec`] per note: its flag count, an optional
//! break depth that splits the group into subgroups after it, and an optional hook hint.
//! Resolution runs in two passes. [`resolve_beams`] decides which positions need a
//! one-sided hook, and [`resolve_beam_layout`] turns the result into the beam segments
//! drawn at each depth.

use crate::NotationError;

/// The side a one-sided beamlet points to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BeamHook {
    /// Toward the previous position.
    Left,
    /// Toward the next position.
    Right,
}

/// One position of a beam group, as given by the caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BeamSpec {
    /// Number of flags the note would have unbeamed. Must be at least one.
    pub flag_count: u8,
    /// Number of beams kept between this position and the next.
    ///
    /// Must be positive and less than `flag_count`. Four 32nds written as two beamed
    /// pairs joined by a single beam have a break depth of 1 on the second note.
    pub break_depth: Option<u8>,
    /// Preferred hook side when a hook is needed and both sides are equally good.
    pub hook: Option<BeamHook>,
}

impl BeamSpec {
    /// A position with `flag_count` flags and no overrides.
    pub const fn new(flag_count: u8) -> Self {
        Self {
            flag_count,
            break_depth: None,
            hook: None,
        }
    }

    /// Builder-style break depth.
    pub const fn with_break_depth(mut self, break_depth: u8) -> Self {
        self.break_depth = Some(break_depth);
        self
    }

    /// Builder-style hook hint.
    pub const fn with_hook(mut self, hook: BeamHook) -> Self {
        self.hook = Some(hook);
        self
    }
}

/// A resolved position: the given flag count and break depth plus the hook it needs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BeamState {
    /// Number of beams at this position.
    pub flag_count: u8,
    /// Break depth copied from the spec.
    pub break_depth: Option<u8>,
    /// The hook this position needs, if any.
    pub hook: Option<BeamHook>,
}

impl BeamState {
    /// The [`BeamSpec`] this state was resolved from, without its hook hint.
    pub fn to_spec(&self) -> BeamSpec {
        BeamSpec {
            flag_count: self.flag_count,
            break_depth: self.break_depth,
            hook: None,
        }
    }
}

/// A beam segment at one depth.
///
/// Depth 1 is the primary beam, the one furthest from the noteheads.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BeamPath {
    /// Beam depth, starting at 1.
    pub depth: u8,
    /// Index of the first position the segment touches.
    pub start: usize,
    /// Index of the last position the segment touches. Equal to `start` for hooks.
    pub end: usize,
    /// For a one-position segment, the side its beamlet points to.
    pub hook: Option<BeamHook>,
}

impl BeamPath {
    /// Whether this is a one-sided beamlet.
    pub fn is_hook(&self) -> bool {
        self.hook.is_some()
    }
}

fn validate(specs: &[BeamSpec]) -> Result<(), NotationError> {
    if specs.len() < 2 {
        return Err(NotationError::TooFewBeamMembers(specs.len()));
    }
    for (index, spec) in specs.iter().enumerate() {
        if spec.flag_count == 0 {
            return Err(NotationError::InvalidBeamSpec {
                index,
                reason: "flag count must be positive",
            });
        }
        if let Some(depth) = spec.break_depth {
            if depth == 0 || depth >= spec.flag_count {
                return Err(NotationError::InvalidBeamSpec {
                    index,
                    reason: "break depth must be positive and below the flag count",
                });
            }
        }
    }
    Ok(())
}

/// Number of beams joining two adjacent positions.
fn link_depth(left: &BeamSpec, right: &BeamSpec) -> u8 {
    let shared = left.flag_count.min(right.flag_count);
    left.break_depth.map_or(shared, |depth| shared.min(depth))
}

/// Decide which positions of a beam group need a hook.
///
/// A position needs a hook when it has more beams than it shares with either neighbor.
/// The hook points to the neighbor it shares more beams with. When both neighbors share
/// the same number of beams the position's own hint decides, defaulting to [`BeamHook::Left`].
/// Only immediate neighbors are considered.
///
/// Fails with [`NotationError::TooFewBeamMembers`] for fewer than two positions and with
/// [`NotationError::InvalidBeamSpec`] for a zero flag count or an out of range break depth.
pub fn resolve_beams(specs: &[BeamSpec]) -> Result<Vec<BeamState>, NotationError> {
    validate(specs)?;
    let states = specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let left = i
                .checked_sub(1)
                .map_or(0, |prev| link_depth(&specs[prev], spec));
            let right = specs.get(i + 1).map_or(0, |next| link_depth(spec, next));
            let hook = if spec.flag_count <= left.max(right) {
                None
            } else if left < right {
                Some(BeamHook::Right)
            } else if left > right {
                Some(BeamHook::Left)
            } else {
                Some(spec.hook.unwrap_or(BeamHook::Left))
            };
            BeamState {
                flag_count: spec.flag_count,
                break_depth: spec.break_depth,
                hook,
            }
        })
        .collect();
    Ok(states)
}

/// The beam segments of a group, ordered by depth and then left to right.
///
/// At each depth, contiguous positions with at least that many flags are joined into one
/// segment. A segment ends early after a position whose break depth is below the depth.
/// Segments touching a single position become hooks.
pub fn resolve_beam_layout(specs: &[BeamSpec]) -> Result<Vec<BeamPath>, NotationError> {
    let states = resolve_beams(specs)?;
    let max_depth = states.iter().map(|s| s.flag_count).max().unwrap_or(0);
    let mut paths = Vec::new();
    let mut push = |depth: u8, start: usize, end: usize| {
        let hook = if start == end {
            // Lone positions always have a resolved hook.
            Some(states[start].hook.unwrap_or(BeamHook::Left))
        } else {
            None
        };
        paths.push(BeamPath {
            depth,
            start,
            end,
            hook,
        });
    };
    for depth in 1..=max_depth {
        let mut run_start = None;
        for (i, state) in states.iter().enumerate() {
            if state.flag_count < depth {
                if let Some(start) = run_start.take() {
                    push(depth, start, i - 1);
                }
                continue;
            }
            let start = *run_start.get_or_insert(i);
            let breaks = state.break_depth.is_some_and(|d| d < depth);
            if breaks || i + 1 == states.len() {
                push(depth, start, i);
                run_start = None;
            }
        }
    }
    tracing::trace!(positions = specs.len(), paths = paths.len(), "resolved beam layout");
    Ok(paths)
}
