//! Bounded route storage with anchor-preserving compaction.
//!
//! When a push would exceed the cap, the buffer keeps:
//! - the first point (session anchor)
//! - the most recent `recent_points` at full resolution
//! - a uniform sub-sample of everything in between
//!
//! The middle budget is half of the free space so compaction leaves
//! headroom instead of running on every subsequent push.

use std::fmt;

use contracts::{RouteBufferConfig, RoutePoint};

/// Size-bounded ordered sequence of accepted points
#[derive(Clone)]
pub struct RouteBuffer {
    points: Vec<RoutePoint>,
    max_points: usize,
    recent_points: usize,
    compactions: u64,
}

impl fmt::Debug for RouteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteBuffer")
            .field("len", &self.points.len())
            .field("max_points", &self.max_points)
            .field("compactions", &self.compactions)
            .finish()
    }
}

impl RouteBuffer {
    /// Create a new route buffer
    ///
    /// `recent_points` is clamped so the anchor and at least one middle
    /// slot always fit.
    pub fn new(config: &RouteBufferConfig) -> Self {
        let max_points = config.max_points.max(4);
        let recent_points = config.recent_points.clamp(1, max_points - 3);
        Self {
            points: Vec::with_capacity(max_points),
            max_points,
            recent_points,
            compactions: 0,
        }
    }

    /// Append a point, compacting first when at the cap
    ///
    /// Returns true if a compaction ran.
    pub fn push(&mut self, point: RoutePoint) -> bool {
        let compacted = self.compact();
        self.points.push(point);
        compacted
    }

    /// Compact if the buffer is at the cap; no-op otherwise
    pub fn compact(&mut self) -> bool {
        let len = self.points.len();
        if len < self.max_points {
            return false;
        }

        let middle_end = len - self.recent_points;
        let middle_len = middle_end - 1;
        let budget = (self.max_points - 1 - self.recent_points) / 2;

        let mut kept = Vec::with_capacity(self.max_points);
        kept.push(self.points[0]);
        if budget > 0 && middle_len > 0 {
            let stride = middle_len.div_ceil(budget);
            kept.extend(self.points[1..middle_end].iter().step_by(stride).copied());
        }
        kept.extend_from_slice(&self.points[middle_end..]);

        tracing::debug!(
            before = len,
            after = kept.len(),
            "route buffer compacted"
        );
        self.points = kept;
        self.compactions += 1;
        true
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&RoutePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&RoutePoint> {
        self.points.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    pub fn compactions(&self) -> u64 {
        self.compactions
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.compactions = 0;
    }

    /// Consume the buffer, yielding the route
    pub fn into_points(self) -> Vec<RoutePoint> {
        self.points
    }
}
