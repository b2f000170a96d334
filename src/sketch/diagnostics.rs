//! Per-annotation sampling diagnostics.
//!
//! Sample misses never abort a sampling pass; they leave gaps in the polyline
//! and are counted here instead.

use std::fmt;

use serde::Serialize;

use crate::geom::SketchTimingReport;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingDiagnostics {
    /// 2D sample coordinates handed to the projection strategy.
    pub evaluated_count: usize,

    /// Samples that landed on the surface.
    pub projected_count: usize,

    /// Samples whose projection missed the surface (silhouettes, strong
    /// curvature, rays leaving the mesh).
    pub missed_count: usize,

    /// Time spent sampling and projecting this annotation. Only populated
    /// with the `sketch_metrics` feature on native targets.
    #[serde(skip)]
    pub timing: Option<SketchTimingReport>,

    pub warnings: Vec<String>,
}

impl SamplingDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every evaluated sample was projected.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missed_count == 0
    }

    /// Nothing landed on the surface.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projected_count == 0
    }

    pub fn record(&mut self, projected: bool) {
        self.evaluated_count += 1;
        if projected {
            self.projected_count += 1;
        } else {
            self.missed_count += 1;
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Format: `"S:{evaluated} P:{projected} [missed:{n}]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "S:{} P:{}",
            self.evaluated_count, self.projected_count
        )];
        if self.missed_count > 0 {
            parts.push(format!("missed:{}", self.missed_count));
        }
        if !self.warnings.is_empty() {
            parts.push(format!("warnings:{}", self.warnings.len()));
        }
        parts.join(" ")
    }
}

impl fmt::Display for SamplingDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sampling Diagnostics:")?;
        writeln!(f, "  Samples: {}", self.evaluated_count)?;
        writeln!(f, "  Projected: {}", self.projected_count)?;
        if self.missed_count > 0 {
            writeln!(f, "  Missed: {}", self.missed_count)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        let status = if self.is_empty() {
            "EMPTY"
        } else if self.is_complete() {
            "COMPLETE"
        } else {
            "GAPS"
        };
        writeln!(f, "  Status: {status}")?;

        Ok(())
    }
}
