//! Opt-in timing hooks for the sketching pipeline.
//!
//! Timing is only collected when the `sketch_metrics` feature is enabled and
//! the target is not WASM (`std::time::Instant` is unavailable there). In every
//! other build the calls compile down to running the closure.
//!
//! ```ignore
//! use surface_sketch::geom::{SketchMetrics, TimingBucket};
//!
//! let mut metrics = SketchMetrics::default();
//! metrics.begin();
//! let hit = metrics.time(TimingBucket::RayCast, || surface.cast_ray(origin, dir));
//! if let Some(report) = metrics.end() {
//!     println!("ray casts: {} ns", report.ray_cast_ns);
//! }
//! ```

/// Phases of a sketch rebuild that are timed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Rectangle/circle/polygon/spline control shape construction.
    ShapeGeneration,
    /// Walking control shapes and producing sample coordinates.
    Sampling,
    /// Camera-ray and lifted-ray surface casts.
    RayCast,
    /// Closest-point surface queries.
    NearestPoint,
    /// Full `AnnotationSession::geometry` rebuilds.
    SessionRebuild,
}

/// Cumulative nanoseconds per [`TimingBucket`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SketchTimingReport {
    pub shape_generation_ns: u64,
    pub sampling_ns: u64,
    pub ray_cast_ns: u64,
    pub nearest_point_ns: u64,
    pub session_rebuild_ns: u64,
}

impl SketchTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.shape_generation_ns
            .saturating_add(self.sampling_ns)
            .saturating_add(self.ray_cast_ns)
            .saturating_add(self.nearest_point_ns)
            .saturating_add(self.session_rebuild_ns)
    }

    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    fn bucket_mut(&mut self, bucket: TimingBucket) -> &mut u64 {
        match bucket {
            TimingBucket::ShapeGeneration => &mut self.shape_generation_ns,
            TimingBucket::Sampling => &mut self.sampling_ns,
            TimingBucket::RayCast => &mut self.ray_cast_ns,
            TimingBucket::NearestPoint => &mut self.nearest_point_ns,
            TimingBucket::SessionRebuild => &mut self.session_rebuild_ns,
        }
    }

    /// Adds `nanos` to `bucket`, saturating at `u64::MAX`.
    pub fn add(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = self.bucket_mut(bucket);
        *slot = slot.saturating_add(nanos);
    }

    /// Adds every bucket of `other`.
    pub fn merge(&mut self, other: &SketchTimingReport) {
        self.add(TimingBucket::ShapeGeneration, other.shape_generation_ns);
        self.add(TimingBucket::Sampling, other.sampling_ns);
        self.add(TimingBucket::RayCast, other.ray_cast_ns);
        self.add(TimingBucket::NearestPoint, other.nearest_point_ns);
        self.add(TimingBucket::SessionRebuild, other.session_rebuild_ns);
    }
}

/// Accumulator for timing sketch operations.
///
/// Call [`begin`](Self::begin) to reset, wrap work with [`time`](Self::time),
/// and read the totals with [`end`](Self::end). With metrics disabled every
/// method is a no-op and `end` returns `None`.
#[derive(Debug, Default)]
pub struct SketchMetrics {
    #[cfg(all(feature = "sketch_metrics", not(target_arch = "wasm32")))]
    report: SketchTimingReport,
}

impl SketchMetrics {
    pub fn begin(&mut self) {
        #[cfg(all(feature = "sketch_metrics", not(target_arch = "wasm32")))]
        {
            self.report = SketchTimingReport::default();
        }
    }

    #[must_use]
    pub fn end(&self) -> Option<SketchTimingReport> {
        #[cfg(all(feature = "sketch_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "sketch_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Folds a report collected elsewhere into this one.
    pub fn absorb(&mut self, report: Option<&SketchTimingReport>) {
        #[cfg(all(feature = "sketch_metrics", not(target_arch = "wasm32")))]
        if let Some(report) = report {
            self.report.merge(report);
        }

        #[cfg(not(all(feature = "sketch_metrics", not(target_arch = "wasm32"))))]
        let _ = report;
    }

    /// Runs `f` and accumulates its wall time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "sketch_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.report.add(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "sketch_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }
}
