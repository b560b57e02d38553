// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The glyph metrics provider contract and two providers.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use stave_units::{Point, Unit, UnitRect};

use crate::SceneError;

/// Measurements of one glyph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphInfo {
    /// Bounds relative to the glyph origin.
    pub bounding_rect: UnitRect,
    /// Horizontal advance.
    pub advance_width: Unit,
    /// Named anchor points relative to the glyph origin.
    pub anchors: BTreeMap<String, Point>,
}

impl GlyphInfo {
    /// Glyph metrics with no anchors.
    pub fn new(bounding_rect: UnitRect, advance_width: Unit) -> Self {
        Self {
            bounding_rect,
            advance_width,
            anchors: BTreeMap::new(),
        }
    }

    /// Builder-style anchor.
    pub fn with_anchor(mut self, name: impl Into<String>, pos: Point) -> Self {
        self.anchors.insert(name.into(), pos);
        self
    }

    /// These metrics multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let r = self.bounding_rect;
        Self {
            bounding_rect: UnitRect::new(r.x * factor, r.y * factor, r.width * factor, r.height * factor),
            advance_width: self.advance_width * factor,
            anchors: self
                .anchors
                .iter()
                .map(|(name, pos)| (name.clone(), *pos * factor))
                .collect(),
        }
    }
}

/// Looks up glyph metrics by name and optional alternate index.
///
/// Lookups must be deterministic so results can be cached.
pub trait GlyphMetrics {
    /// Name of the font the metrics describe.
    fn font_name(&self) -> &str;

    /// Metrics for `name`, or its `alternate`th alternate.
    ///
    /// Fails with [`SceneError::GlyphNotFound`] for unknown glyphs.
    fn glyph_info(&self, name: &str, alternate: Option<usize>) -> Result<GlyphInfo, SceneError>;
}

/// An in-memory glyph table.
#[derive(Clone, Debug, Default)]
pub struct GlyphTable {
    font: String,
    glyphs: HashMap<(String, Option<usize>), GlyphInfo>,
}

impl GlyphTable {
    /// An empty table for `font`.
    pub fn new(font: impl Into<String>) -> Self {
        Self {
            font: font.into(),
            glyphs: HashMap::new(),
        }
    }

    /// Add or replace a glyph.
    pub fn insert(&mut self, name: impl Into<String>, alternate: Option<usize>, info: GlyphInfo) {
        self.glyphs.insert((name.into(), alternate), info);
    }

    /// Builder-style [`GlyphTable::insert`] for a glyph's main form.
    pub fn with_glyph(mut self, name: impl Into<String>, info: GlyphInfo) -> Self {
        self.insert(name, None, info);
        self
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl GlyphMetrics for GlyphTable {
    fn font_name(&self) -> &str {
        &self.font
    }

    fn glyph_info(&self, name: &str, alternate: Option<usize>) -> Result<GlyphInfo, SceneError> {
        self.glyphs
            .get(&(name.to_owned(), alternate))
            .cloned()
            .ok_or_else(|| SceneError::GlyphNotFound {
                name: name.to_owned(),
                alternate,
            })
    }
}

type CacheKey = (String, Option<usize>, String, i64);

/// Scales and caches another provider's metrics.
///
/// Results are cached by glyph name, alternate, font, and scale rounded to hundredths.
/// Failed lookups are not cached.
#[derive(Debug)]
pub struct CachedGlyphMetrics<P> {
    inner: P,
    scale: f64,
    cache: RefCell<HashMap<CacheKey, GlyphInfo>>,
}

impl<P: GlyphMetrics> CachedGlyphMetrics<P> {
    /// Wrap `inner`, scaling its metrics by `scale`.
    pub fn new(inner: P, scale: f64) -> Self {
        Self {
            inner,
            scale,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// The current scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Change the scale. Entries for other scales stay cached.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    /// Number of cached entries.
    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Scale keys only need to distinguish practical font scales."
    )]
    fn key(&self, name: &str, alternate: Option<usize>) -> CacheKey {
        (
            name.to_owned(),
            alternate,
            self.inner.font_name().to_owned(),
            (self.scale * 100.0).round() as i64,
        )
    }
}

impl<P: GlyphMetrics> GlyphMetrics for CachedGlyphMetrics<P> {
    fn font_name(&self) -> &str {
        self.inner.font_name()
    }

    fn glyph_info(&self, name: &str, alternate: Option<usize>) -> Result<GlyphInfo, SceneError> {
        let key = self.key(name, alternate);
        if let Some(hit) = self.cache.borrow().get(&key) {
            return Ok(hit.clone());
        }
        let info = self.inner.glyph_info(name, alternate)?.scaled(self.scale);
        tracing::trace!(glyph = name, ?alternate, scale = self.scale, "cached glyph metrics");
        self.cache.borrow_mut().insert(key, info.clone());
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    fn notehead() -> GlyphInfo {
        GlyphInfo::new(
            UnitRect::new(Unit::ZERO, Unit::mm(-1.0), Unit::mm(2.0), Unit::mm(2.0)),
            Unit::mm(2.1),
        )
        .with_anchor("stemUpSE", Point::new(Unit::mm(2.0), Unit::mm(-0.3)))
    }

    #[test]
    fn table_lookup_and_missing_glyph() {
        let mut table = GlyphTable::new("Bravura").with_glyph("noteheadBlack", notehead());
        table.insert("noteheadBlack", Some(1), GlyphInfo::default());
        assert_eq!(table.len(), 2);
        assert_eq!(table.glyph_info("noteheadBlack", None).unwrap(), notehead());
        assert_eq!(
            table.glyph_info("noteheadBlack", Some(2)),
            Err(SceneError::GlyphNotFound {
                name: "noteheadBlack".to_owned(),
                alternate: Some(2),
            })
        );
    }

    #[derive(Debug)]
    struct Counting {
        table: GlyphTable,
        lookups: Cell<usize>,
    }

    impl GlyphMetrics for Counting {
        fn font_name(&self) -> &str {
            self.table.font_name()
        }

        fn glyph_info(&self, name: &str, alternate: Option<usize>) -> Result<GlyphInfo, SceneError> {
            self.lookups.set(self.lookups.get() + 1);
            self.table.glyph_info(name, alternate)
        }
    }

    #[test]
    fn cache_scales_and_reuses_results() {
        let inner = Counting {
            table: GlyphTable::new("Bravura").with_glyph("noteheadBlack", notehead()),
            lookups: Cell::new(0),
        };
        let mut cached = CachedGlyphMetrics::new(inner, 2.0);
        let first = cached.glyph_info("noteheadBlack", None).unwrap();
        let second = cached.glyph_info("noteheadBlack", None).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.advance_width, Unit::mm(4.2));
        assert_eq!(first.anchors["stemUpSE"], Point::new(Unit::mm(4.0), Unit::mm(-0.6)));
        assert_eq!(cached.inner().lookups.get(), 1);

        cached.set_scale(1.0);
        let unscaled = cached.glyph_info("noteheadBlack", None).unwrap();
        assert_eq!(unscaled.advance_width, Unit::mm(2.1));
        assert_eq!(cached.cached_len(), 2);

        assert!(cached.glyph_info("missing", None).is_err());
        assert_eq!(cached.cached_len(), 2);
    }
}
