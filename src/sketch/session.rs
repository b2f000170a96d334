//! Multi-gesture drawing session.
//!
//! An [`AnnotationSession`] turns pointer events into anchors, anchors into
//! control shapes and control shapes into sampled annotations. The coarse
//! state is an explicit [`SessionState`] driven by [`SessionState::on`]; all
//! geometry is rebuilt from the stored anchors, never patched in place.

use serde::Serialize;

use crate::geom::{
    Camera, Point3, SketchMetrics, SketchTimingReport, SurfacePoint, SurfaceQuery, TangentFrame,
    TimingBucket, Vec2,
};

use super::config::{DRAG_THRESHOLD, SamplingOptions, SessionConfig};
use super::diagnostics::SamplingDiagnostics;
use super::error::SketchError;
use super::geometry::{PolylineStatus, SceneGeometry, SceneItem, SceneKey};
use super::projection::{ProjectionStrategy, camera_facing_frame, shape_basis};
use super::sampler::{Annotation, sample_annotation};
use super::shape::{ControlShape, build_shape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// No anchors and no uncommitted annotations.
    #[default]
    Idle,
    /// Anchors or live annotations exist; waiting for the next anchor.
    Drawing,
    /// Like `Drawing`, with a preview following the pointer.
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A pointer press (or drag release) added an anchor.
    AnchorAdded,
    /// A two-anchor shape received its second anchor and became live.
    ShapeFinished,
    /// The preview was rebuilt from a tentative pointer position.
    PreviewUpdated,
    Complete,
    Cancel,
    /// A configuration change discarded the shape in progress.
    Invalidate,
}

impl SessionState {
    /// Transition table of the session.
    #[must_use]
    pub const fn on(self, event: SessionEvent) -> Self {
        match (self, event) {
            (_, SessionEvent::Complete | SessionEvent::Cancel | SessionEvent::Invalidate) => {
                Self::Idle
            }
            (_, SessionEvent::AnchorAdded | SessionEvent::ShapeFinished) => Self::Drawing,
            (Self::Idle, SessionEvent::PreviewUpdated) => Self::Idle,
            (Self::Drawing | Self::Preview, SessionEvent::PreviewUpdated) => Self::Preview,
        }
    }
}

/// Collaborators a session reads from while handling an event.
#[derive(Debug)]
pub struct SketchContext<'a, Q: ?Sized> {
    pub query: &'a Q,
    pub camera: &'a Camera,
}

impl<Q: ?Sized> Clone for SketchContext<'_, Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Q: ?Sized> Copy for SketchContext<'_, Q> {}

impl<'a, Q: SurfaceQuery + ?Sized> SketchContext<'a, Q> {
    #[must_use]
    pub fn new(query: &'a Q, camera: &'a Camera) -> Self {
        Self { query, camera }
    }

    fn pick(&self, ndc: Vec2) -> Option<SurfacePoint> {
        self.camera.pick(self.query, ndc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    /// Screen NDC or frame `(u, v)`, depending on the projection mode.
    coord: Vec2,
    /// Surface under the pointer when the anchor was placed.
    surface: Option<SurfacePoint>,
}

#[derive(Debug, Clone, PartialEq)]
struct StoredAnnotation {
    id: u64,
    annotation: Annotation,
}

#[derive(Debug, Default)]
pub struct AnnotationSession {
    config: SessionConfig,
    sampling: SamplingOptions,
    state: SessionState,
    orbit: bool,
    anchors: Vec<Anchor>,
    /// Frame of the shape being drawn, tangent modes only.
    frame: Option<TangentFrame>,
    /// Where the current press started, for drag detection.
    press: Option<Vec2>,
    preview: Option<Annotation>,
    live: Vec<StoredAnnotation>,
    committed: Vec<StoredAnnotation>,
    next_id: u64,
    last_diagnostics: Option<SamplingDiagnostics>,
    metrics: SketchMetrics,
}

impl AnnotationSession {
    #[must_use]
    pub fn new() -> Self {
        let mut session = Self::default();
        session.metrics.begin();
        session
    }

    pub fn with_config(config: SessionConfig, sampling: SamplingOptions) -> Result<Self, SketchError> {
        config.validate()?;
        sampling.validate()?;
        let mut session = Self::new();
        session.config = config;
        session.sampling = sampling;
        Ok(session)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    #[must_use]
    pub fn sampling(&self) -> SamplingOptions {
        self.sampling
    }

    #[must_use]
    pub fn is_orbiting(&self) -> bool {
        self.orbit
    }

    /// Anchors of the shape in progress.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.anchors.len()
    }

    #[must_use]
    pub fn vertices(&self) -> Vec<Vec2> {
        self.anchors.iter().map(|a| a.coord).collect()
    }

    #[must_use]
    pub fn frame(&self) -> Option<&TangentFrame> {
        self.frame.as_ref()
    }

    #[must_use]
    pub fn preview(&self) -> Option<&Annotation> {
        self.preview.as_ref()
    }

    /// Finished but uncommitted annotations, oldest first.
    pub fn live_annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.live.iter().map(|stored| &stored.annotation)
    }

    pub fn committed_annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.committed.iter().map(|stored| &stored.annotation)
    }

    /// Diagnostics of the most recent finished shape.
    #[must_use]
    pub fn last_diagnostics(&self) -> Option<&SamplingDiagnostics> {
        self.last_diagnostics.as_ref()
    }

    #[must_use]
    pub fn timing(&self) -> Option<SketchTimingReport> {
        self.metrics.end()
    }

    /// Swap in a new configuration.
    ///
    /// Invalid combinations are refused and the previous configuration stays.
    /// Changing anything but chaining discards the shape in progress and any
    /// live annotations.
    pub fn set_config(&mut self, config: SessionConfig) -> Result<SessionState, SketchError> {
        if let Err(err) = config.validate() {
            log::warn!("rejected session config {config:?}: {err}");
            return Err(err.into());
        }

        let invalidates = self.config.invalidates(&config);
        self.config = config;
        if invalidates {
            self.clear_gesture();
            self.live.clear();
            self.state = self.state.on(SessionEvent::Invalidate);
            log::debug!(
                "session config changed to {} / {}, gesture cleared",
                config.shape,
                config.projection
            );
        }
        Ok(self.state)
    }

    pub fn set_sampling(&mut self, sampling: SamplingOptions) -> Result<(), SketchError> {
        if let Err(err) = sampling.validate() {
            log::warn!("rejected sampling options {sampling:?}: {err}");
            return Err(err.into());
        }
        self.sampling = sampling;
        Ok(())
    }

    /// Flip orbit mode. While orbiting, pointer events are ignored; the session
    /// itself is kept.
    pub fn toggle_orbit(&mut self) -> bool {
        self.orbit = !self.orbit;
        self.press = None;
        self.orbit
    }

    pub fn pointer_down<Q>(
        &mut self,
        ctx: SketchContext<'_, Q>,
        ndc: Vec2,
    ) -> Result<SessionState, SketchError>
    where
        Q: SurfaceQuery + ?Sized,
    {
        if self.orbit {
            return Ok(self.state);
        }
        self.press = None;
        self.add_anchor(ctx, ndc)?;
        self.press = Some(ndc);
        self.finish_if_ready(ctx)
    }

    /// Rebuild the preview from the anchors plus a tentative vertex at `ndc`.
    ///
    /// The anchor list is left untouched. A pointer that misses the surface in
    /// a tangent mode clears the preview.
    pub fn pointer_move<Q>(
        &mut self,
        ctx: SketchContext<'_, Q>,
        ndc: Vec2,
    ) -> Result<SessionState, SketchError>
    where
        Q: SurfaceQuery + ?Sized,
    {
        if self.orbit || self.anchors.is_empty() {
            return Ok(self.state);
        }

        self.preview = None;
        let Some(tentative) = self.tentative_coord(ctx, ndc) else {
            return Ok(self.state);
        };

        let mut coords = self.vertices();
        coords.push(tentative);
        let Some(shape) = self.shape_for(ctx.camera, &coords, false) else {
            return Ok(self.state);
        };

        let sampled = self.sample(ctx, &shape);
        if !sampled.is_empty() {
            self.preview = Some(sampled);
        }
        self.state = self.state.on(SessionEvent::PreviewUpdated);
        Ok(self.state)
    }

    /// End of a press. Releasing a two-anchor shape away from where it was
    /// pressed places the second anchor there.
    pub fn pointer_up<Q>(
        &mut self,
        ctx: SketchContext<'_, Q>,
        ndc: Vec2,
    ) -> Result<SessionState, SketchError>
    where
        Q: SurfaceQuery + ?Sized,
    {
        let Some(press) = self.press.take() else {
            return Ok(self.state);
        };
        if self.orbit
            || !self.config.shape.is_two_anchor()
            || self.anchors.len() != 1
            || press.distance_to(ndc) <= DRAG_THRESHOLD
        {
            return Ok(self.state);
        }

        self.add_anchor(ctx, ndc)?;
        self.finish_if_ready(ctx)
    }

    /// Close polygons/splines and commit every live annotation.
    ///
    /// A lone anchor of an unfinished rectangle/circle is dropped.
    pub fn complete<Q>(&mut self, ctx: SketchContext<'_, Q>) -> Result<SessionState, SketchError>
    where
        Q: SurfaceQuery + ?Sized,
    {
        let mut result = Ok(());
        if !self.config.shape.is_two_anchor() && !self.anchors.is_empty() {
            let coords = self.vertices();
            if let Some(shape) = self.shape_for(ctx.camera, &coords, true) {
                result = self.store_live(ctx, &shape, self.frame);
            }
        }

        let committed = self.live.len();
        self.committed.append(&mut self.live);
        self.clear_gesture();
        self.state = self.state.on(SessionEvent::Complete);
        log::debug!("committed {committed} annotations");

        result.map(|()| self.state)
    }

    /// Drop anchors, live annotations, preview and markers. Committed
    /// annotations stay.
    pub fn cancel(&mut self) -> SessionState {
        self.clear_gesture();
        self.live.clear();
        self.state = self.state.on(SessionEvent::Cancel);
        self.state
    }

    /// Drop committed annotations as well.
    pub fn clear(&mut self) -> SessionState {
        self.committed.clear();
        self.cancel()
    }

    /// Snapshot of everything the renderer should show.
    #[must_use]
    pub fn geometry(&self) -> SceneGeometry {
        let mut scene = SceneGeometry::new();
        for stored in &self.committed {
            scene.insert(
                SceneKey::Annotation(stored.id),
                SceneItem::polyline(&stored.annotation, PolylineStatus::Committed),
            );
        }
        for stored in &self.live {
            scene.insert(
                SceneKey::Annotation(stored.id),
                SceneItem::polyline(&stored.annotation, PolylineStatus::Live),
            );
        }
        if let Some(preview) = &self.preview {
            scene.insert(
                SceneKey::Preview,
                SceneItem::polyline(preview, PolylineStatus::Preview),
            );
        }
        scene.insert(SceneKey::Markers, SceneItem::markers(&self.marker_points()));
        scene
    }

    fn marker_points(&self) -> Vec<Point3> {
        self.anchors
            .iter()
            .filter_map(|anchor| anchor.surface)
            .map(|hit| hit.lifted(self.sampling.surface_offset))
            .collect()
    }

    fn add_anchor<Q>(&mut self, ctx: SketchContext<'_, Q>, ndc: Vec2) -> Result<(), SketchError>
    where
        Q: SurfaceQuery + ?Sized,
    {
        let hit = ctx.pick(ndc);
        let coord = if self.config.projection.uses_tangent_frame() {
            let hit = hit.ok_or(SketchError::NoIntersection)?;
            match &self.frame {
                Some(frame) => frame.local_of_point(hit.position),
                None => {
                    self.frame = Some(camera_facing_frame(hit, ctx.camera.eye())?);
                    Vec2::ZERO
                }
            }
        } else {
            ndc
        };

        self.anchors.push(Anchor { coord, surface: hit });
        self.preview = None;
        self.state = self.state.on(SessionEvent::AnchorAdded);
        log::debug!(
            "{} anchor {} at {coord:?}",
            self.config.shape,
            self.anchors.len()
        );
        Ok(())
    }

    fn finish_if_ready<Q>(&mut self, ctx: SketchContext<'_, Q>) -> Result<SessionState, SketchError>
    where
        Q: SurfaceQuery + ?Sized,
    {
        if !self.config.shape.is_two_anchor() || self.anchors.len() < 2 {
            return Ok(self.state);
        }

        let Some(&last) = self.anchors.last() else {
            return Ok(self.state);
        };
        let coords = self.vertices();
        let stored = match self.shape_for(ctx.camera, &coords, true) {
            Some(shape) => self.store_live(ctx, &shape, self.frame),
            None => Ok(()),
        };

        self.clear_gesture();
        self.state = self.state.on(SessionEvent::ShapeFinished);
        if self.config.chained {
            self.restart_chain(ctx, last)?;
        }
        stored.map(|()| self.state)
    }

    /// Seed the next chained shape with the previous shape's last anchor.
    fn restart_chain<Q>(&mut self, ctx: SketchContext<'_, Q>, last: Anchor) -> Result<(), SketchError>
    where
        Q: SurfaceQuery + ?Sized,
    {
        let coord = if self.config.projection.uses_tangent_frame() {
            let hit = last.surface.ok_or(SketchError::NoIntersection)?;
            self.frame = Some(camera_facing_frame(hit, ctx.camera.eye())?);
            Vec2::ZERO
        } else {
            last.coord
        };
        self.anchors.push(Anchor {
            coord,
            surface: last.surface,
        });
        Ok(())
    }

    fn tentative_coord<Q>(&self, ctx: SketchContext<'_, Q>, ndc: Vec2) -> Option<Vec2>
    where
        Q: SurfaceQuery + ?Sized,
    {
        match &self.frame {
            Some(frame) if self.config.projection.uses_tangent_frame() => {
                ctx.pick(ndc).map(|hit| frame.local_of_point(hit.position))
            }
            _ if self.config.projection.uses_tangent_frame() => None,
            _ => Some(ndc),
        }
    }

    fn shape_for(&mut self, camera: &Camera, coords: &[Vec2], closed: bool) -> Option<ControlShape> {
        let config = self.config;
        let basis = shape_basis(self.frame.as_ref(), camera);
        self.metrics.time(TimingBucket::ShapeGeneration, || {
            build_shape(&config, coords, closed, basis)
        })
    }

    fn sample<Q>(&mut self, ctx: SketchContext<'_, Q>, shape: &ControlShape) -> Annotation
    where
        Q: SurfaceQuery + ?Sized,
    {
        let Some(strategy) = ProjectionStrategy::for_mode(
            self.config.projection,
            self.frame,
            ctx.camera,
            self.sampling.ray_lift,
        ) else {
            return Annotation::default();
        };
        let sampled = sample_annotation(shape, &strategy, ctx.query, &self.sampling, &mut self.metrics);
        sampled.annotation
    }

    fn store_live<Q>(
        &mut self,
        ctx: SketchContext<'_, Q>,
        shape: &ControlShape,
        frame: Option<TangentFrame>,
    ) -> Result<(), SketchError>
    where
        Q: SurfaceQuery + ?Sized,
    {
        let Some(strategy) = ProjectionStrategy::for_mode(
            self.config.projection,
            frame,
            ctx.camera,
            self.sampling.ray_lift,
        ) else {
            return Err(SketchError::EmptyAnnotation);
        };

        let sampled = sample_annotation(shape, &strategy, ctx.query, &self.sampling, &mut self.metrics);
        self.last_diagnostics = Some(sampled.diagnostics);
        if sampled.annotation.is_empty() {
            log::warn!("{} produced no surface points, nothing to render", shape.kind());
            return Err(SketchError::EmptyAnnotation);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.live.push(StoredAnnotation {
            id,
            annotation: sampled.annotation,
        });
        Ok(())
    }

    fn clear_gesture(&mut self) {
        self.anchors.clear();
        self.frame = None;
        self.press = None;
        self.preview = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{CameraSettings, MeshSurface, SurfaceMesh, Tolerance, Vec3};
    use crate::sketch::config::{ProjectionMode, ShapeKind};
    use crate::sketch::error::ConfigError;

    fn plane() -> MeshSurface {
        MeshSurface::new(SurfaceMesh::plane(2.0, 4)).expect("plane")
    }

    fn session(shape: ShapeKind, projection: ProjectionMode) -> AnnotationSession {
        AnnotationSession::with_config(
            SessionConfig::new(shape, projection),
            SamplingOptions::default(),
        )
        .expect("valid config")
    }

    fn offset_ok(points: &[Point3]) -> bool {
        points
            .iter()
            .all(|p| Tolerance::LOOSE.approx_eq_f64(p.z, SamplingOptions::default().surface_offset))
    }

    #[test]
    fn transition_table() {
        use SessionEvent::*;
        use SessionState::*;

        for state in [Idle, Drawing, Preview] {
            assert_eq!(state.on(Complete), Idle);
            assert_eq!(state.on(Cancel), Idle);
            assert_eq!(state.on(Invalidate), Idle);
            assert_eq!(state.on(AnchorAdded), Drawing);
            assert_eq!(state.on(ShapeFinished), Drawing);
        }
        assert_eq!(Idle.on(PreviewUpdated), Idle);
        assert_eq!(Drawing.on(PreviewUpdated), Preview);
        assert_eq!(Preview.on(PreviewUpdated), Preview);
    }

    #[test]
    fn polygon_completes_into_closed_loop() {
        let surface = plane();
        let camera = Camera::default();
        let ctx = SketchContext::new(&surface, &camera);
        let mut session = session(ShapeKind::Polygon, ProjectionMode::ScreenSpace);

        for ndc in [Vec2::new(-0.2, -0.2), Vec2::new(0.2, -0.2), Vec2::new(0.0, 0.2)] {
            assert_eq!(session.pointer_down(ctx, ndc), Ok(SessionState::Drawing));
            session.pointer_up(ctx, ndc).expect("release");
        }
        assert_eq!(session.vertex_count(), 3);
        assert_eq!(session.live_annotations().count(), 0);

        assert_eq!(session.complete(ctx), Ok(SessionState::Idle));
        assert_eq!(session.vertex_count(), 0);

        let committed: Vec<&Annotation> = session.committed_annotations().collect();
        assert_eq!(committed.len(), 1);
        assert!(committed[0].is_closed());
        assert!(offset_ok(committed[0].points()));

        let diagnostics = session.last_diagnostics().expect("diagnostics");
        assert!(diagnostics.is_complete());
        // Closed loop: the last vertex connects back to the first.
        let density = SamplingOptions::default().density;
        let expected: usize = [(0.4, 0.0), (0.2, 0.4), (0.2, 0.4)]
            .iter()
            .map(|&(dx, dy): &(f64, f64)| {
                crate::sketch::sampler::step_count(density, dx.hypot(dy))
            })
            .sum();
        assert_eq!(diagnostics.evaluated_count, expected);

        let scene = session.geometry();
        assert_eq!(scene.polylines(PolylineStatus::Committed).count(), 1);
        assert!(scene.get(SceneKey::Markers).is_none());
    }

    #[test]
    fn pointer_move_previews_without_adding_anchors() {
        let surface = plane();
        let camera = Camera::default();
        let ctx = SketchContext::new(&surface, &camera);
        let mut session = session(ShapeKind::Polygon, ProjectionMode::ScreenSpace);

        assert_eq!(
            session.pointer_move(ctx, Vec2::new(0.1, 0.1)),
            Ok(SessionState::Idle)
        );
        assert!(session.preview().is_none());

        session.pointer_down(ctx, Vec2::new(-0.1, 0.0)).expect("anchor");
        assert_eq!(
            session.pointer_move(ctx, Vec2::new(0.1, 0.0)),
            Ok(SessionState::Preview)
        );
        assert_eq!(session.vertex_count(), 1);
        let preview = session.preview().expect("preview");
        assert!(!preview.is_closed());
        assert!(session.geometry().get(SceneKey::Preview).is_some());

        session.pointer_down(ctx, Vec2::new(0.1, 0.0)).expect("anchor");
        assert!(session.preview().is_none());
        assert_eq!(session.state(), SessionState::Drawing);
    }

    #[test]
    fn projection_switch_discards_gesture() {
        let surface = plane();
        let camera = Camera::default();
        let ctx = SketchContext::new(&surface, &camera);
        let mut session = session(ShapeKind::Polygon, ProjectionMode::ScreenSpace);

        session.pointer_down(ctx, Vec2::new(0.0, 0.1)).expect("anchor");
        session.pointer_down(ctx, Vec2::new(0.1, 0.1)).expect("anchor");
        assert_eq!(session.vertex_count(), 2);

        let next = SessionConfig::new(ShapeKind::Polygon, ProjectionMode::TangentNearestPoint);
        assert_eq!(session.set_config(next), Ok(SessionState::Idle));
        assert_eq!(session.vertex_count(), 0);
        assert!(session.frame().is_none());
        assert!(session.geometry().is_empty());
    }

    #[test]
    fn chaining_toggle_keeps_gesture() {
        let surface = plane();
        let camera = Camera::default();
        let ctx = SketchContext::new(&surface, &camera);
        let mut session = session(ShapeKind::Rectangle, ProjectionMode::ScreenSpace);

        session.pointer_down(ctx, Vec2::new(0.0, 0.1)).expect("anchor");
        let next = session.config().with_chained(true);
        assert_eq!(session.set_config(next), Ok(SessionState::Drawing));
        assert_eq!(session.vertex_count(), 1);
    }

    #[test]
    fn chained_polygon_is_rejected() {
        let mut session = session(ShapeKind::Rectangle, ProjectionMode::TangentCameraRay);
        let bad = SessionConfig::new(ShapeKind::Polygon, ProjectionMode::ScreenSpace).with_chained(true);

        assert_eq!(
            session.set_config(bad),
            Err(SketchError::InvalidModeCombination(ConfigError::ChainedShape(
                ShapeKind::Polygon
            )))
        );
        assert_eq!(session.config().shape, ShapeKind::Rectangle);
        assert_eq!(session.config().projection, ProjectionMode::TangentCameraRay);
    }

    #[test]
    fn orbit_ignores_pointer_events() {
        let surface = plane();
        let camera = Camera::default();
        let ctx = SketchContext::new(&surface, &camera);
        let mut session = session(ShapeKind::Polygon, ProjectionMode::ScreenSpace);

        assert!(session.toggle_orbit());
        assert_eq!(session.pointer_down(ctx, Vec2::ZERO), Ok(SessionState::Idle));
        assert_eq!(session.pointer_move(ctx, Vec2::X), Ok(SessionState::Idle));
        assert_eq!(session.vertex_count(), 0);

        assert!(!session.toggle_orbit());
        session.pointer_down(ctx, Vec2::ZERO).expect("anchor");
        assert_eq!(session.vertex_count(), 1);
    }

    #[test]
    fn tangent_mode_needs_a_surface_hit() {
        let surface = plane();
        let camera = Camera::default();
        let ctx = SketchContext::new(&surface, &camera);
        let mut session = session(ShapeKind::Rectangle, ProjectionMode::TangentNearestPoint);

        assert_eq!(
            session.pointer_down(ctx, Vec2::new(0.9, 0.9)),
            Err(SketchError::NoIntersection)
        );
        assert_eq!(session.vertex_count(), 0);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.pointer_up(ctx, Vec2::ZERO), Ok(SessionState::Idle));
        assert_eq!(session.vertex_count(), 0);
    }

    #[test]
    fn drag_places_second_anchor() {
        let surface = plane();
        let camera = Camera::default();
        let ctx = SketchContext::new(&surface, &camera);
        let mut session = session(ShapeKind::Rectangle, ProjectionMode::ScreenSpace);

        session.pointer_down(ctx, Vec2::new(-0.1, -0.1)).expect("press");
        assert_eq!(session.pointer_up(ctx, Vec2::new(-0.1, -0.1)), Ok(SessionState::Drawing));
        assert_eq!(session.vertex_count(), 1);

        let mut dragged = self::session(ShapeKind::Circle, ProjectionMode::ScreenSpace);
        dragged.pointer_down(ctx, Vec2::new(-0.1, -0.1)).expect("press");
        assert_eq!(dragged.pointer_up(ctx, Vec2::new(0.1, 0.1)), Ok(SessionState::Drawing));
        assert_eq!(dragged.vertex_count(), 0);
        assert_eq!(dragged.live_annotations().count(), 1);
    }

    #[test]
    fn rectangle_on_plane_in_nearest_point_mode() {
        let surface = plane();
        let camera = Camera::default();
        let ctx = SketchContext::new(&surface, &camera);
        let config = SessionConfig::new(ShapeKind::Rectangle, ProjectionMode::TangentNearestPoint)
            .with_axis_aligned(true);
        let mut session =
            AnnotationSession::with_config(config, SamplingOptions::default()).expect("config");

        let first = Vec2::new(0.02, 0.03);
        let second = Vec2::new(0.12, 0.11);
        let hit = |ndc: Vec2| {
            let ray = camera.ray_through(ndc).expect("ray");
            surface.cast_ray(ray.origin, ray.direction).expect("hit").position
        };
        let (a, c) = (hit(first), hit(second));

        session.pointer_down(ctx, first).expect("first anchor");
        assert_eq!(session.frame().map(|f| f.normal()), Some(Vec3::Z));
        assert_eq!(session.geometry().get(SceneKey::Markers).map(|m| m.points().len()), Some(1));

        assert_eq!(session.pointer_down(ctx, second), Ok(SessionState::Drawing));
        assert_eq!(session.vertex_count(), 0);
        assert!(session.frame().is_none());

        let live: Vec<&Annotation> = session.live_annotations().collect();
        assert_eq!(live.len(), 1);
        let points = live[0].points();
        assert!(live[0].is_closed());
        assert!(offset_ok(points));
        assert!(session.last_diagnostics().is_some_and(SamplingDiagnostics::is_complete));

        // Camera right is world X, so the box spans `a` to `c` on both axes.
        let tol = 1e-6;
        let (lo_x, hi_x) = (a.x.min(c.x) - tol, a.x.max(c.x) + tol);
        let (lo_y, hi_y) = (a.y.min(c.y) - tol, a.y.max(c.y) + tol);
        assert!(
            points
                .iter()
                .all(|p| (lo_x..=hi_x).contains(&p.x) && (lo_y..=hi_y).contains(&p.y))
        );

        assert_eq!(session.complete(ctx), Ok(SessionState::Idle));
        assert_eq!(session.committed_annotations().count(), 1);
    }

    #[test]
    fn chained_rectangles_share_anchor() {
        let surface = plane();
        let camera = Camera::default();
        let ctx = SketchContext::new(&surface, &camera);
        let config = SessionConfig::new(ShapeKind::Rectangle, ProjectionMode::TangentCameraRay)
            .with_chained(true);
        let mut session =
            AnnotationSession::with_config(config, SamplingOptions::default()).expect("config");

        session.pointer_down(ctx, Vec2::new(0.01, 0.02)).expect("first");
        session.pointer_down(ctx, Vec2::new(0.1, 0.1)).expect("second");
        assert_eq!(session.vertex_count(), 1);
        assert!(session.frame().is_some());
        assert_eq!(session.vertices(), vec![Vec2::ZERO]);

        session.pointer_down(ctx, Vec2::new(0.15, 0.02)).expect("third");
        assert_eq!(session.live_annotations().count(), 2);
        assert_eq!(session.vertex_count(), 1);

        assert_eq!(session.complete(ctx), Ok(SessionState::Idle));
        assert_eq!(session.committed_annotations().count(), 2);
        assert_eq!(session.vertex_count(), 0);
    }

    #[test]
    fn camera_facing_away_yields_empty_annotation() {
        let surface = plane();
        let camera = Camera::new(CameraSettings {
            target: [0.0, 0.0, 10.0],
            ..CameraSettings::default()
        })
        .expect("camera");
        let ctx = SketchContext::new(&surface, &camera);
        let mut session = session(ShapeKind::Circle, ProjectionMode::ScreenSpace);

        session.pointer_down(ctx, Vec2::new(-0.1, 0.0)).expect("screen anchors never miss");
        assert_eq!(
            session.pointer_down(ctx, Vec2::new(0.1, 0.0)),
            Err(SketchError::EmptyAnnotation)
        );
        assert_eq!(session.live_annotations().count(), 0);
        assert_eq!(session.vertex_count(), 0);
        assert!(session.last_diagnostics().is_some_and(SamplingDiagnostics::is_empty));
        assert!(session.geometry().is_empty());
    }

    #[test]
    fn cancel_clears_markers_but_keeps_committed() {
        let surface = plane();
        let camera = Camera::default();
        let ctx = SketchContext::new(&surface, &camera);
        let mut session = session(ShapeKind::Polygon, ProjectionMode::TangentCameraRay);

        for ndc in [Vec2::new(0.0, 0.01), Vec2::new(0.1, 0.01), Vec2::new(0.05, 0.1)] {
            session.pointer_down(ctx, ndc).expect("anchor");
        }
        session.complete(ctx).expect("commit");

        session.pointer_down(ctx, Vec2::new(-0.1, -0.1)).expect("anchor");
        assert!(session.geometry().get(SceneKey::Markers).is_some());

        assert_eq!(session.cancel(), SessionState::Idle);
        let scene = session.geometry();
        assert!(scene.get(SceneKey::Markers).is_none());
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.polylines(PolylineStatus::Committed).count(), 1);

        session.clear();
        assert!(session.geometry().is_empty());
    }

    #[test]
    fn invalid_sampling_is_refused() {
        let mut session = AnnotationSession::new();
        let bad = SamplingOptions::default().with_density(0.0);
        assert!(session.set_sampling(bad).is_err());
        assert_eq!(session.sampling(), SamplingOptions::default());
    }
}
