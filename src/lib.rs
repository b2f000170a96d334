#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;
pub mod sketch;

use std::collections::BTreeMap;
use std::fmt;

use geom::{
    Camera, CameraError, CameraSettings, MeshError, MeshSurface, Point3, SketchMetrics,
    SketchTimingReport, SurfaceMesh, TimingBucket, Vec2,
};
use serde::Serialize;
use sketch::{
    AnnotationSession, SamplingDiagnostics, SamplingOptions, SceneItem, SceneKey, SessionConfig,
    SessionState, SketchContext, SketchError,
};
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("kon rayon threadpool niet initialiseren: {err}")))
}

/// Fouten van de engine-facade.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("er is geen mesh geladen")]
    NoSurface,
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Sketch(#[from] SketchError),
}

/// Scene items that changed since the previous [`Engine::geometry_diff`].
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct GeometryDiff {
    pub added: Vec<GeometryDiffItem>,
    pub updated: Vec<GeometryDiffItem>,
    pub removed: Vec<String>,
}

impl GeometryDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryDiffItem {
    pub id: String,
    pub item: SceneItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointerPhase {
    Down,
    Move,
    Up,
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    initialized: bool,
    surface: Option<MeshSurface>,
    camera: Camera,
    session: AnnotationSession,
    scene_map: BTreeMap<SceneKey, SceneItem>,
    metrics: SketchMetrics,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        let mut metrics = SketchMetrics::default();
        metrics.begin();
        Engine {
            initialized: true,
            surface: None,
            camera: Camera::default(),
            session: AnnotationSession::new(),
            scene_map: BTreeMap::new(),
            metrics,
        }
    }

    /// Geeft terug of de engine de minimale initialisatie heeft doorlopen.
    #[wasm_bindgen]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Laad een driehoeksmesh (platte positiebuffer en indexlijst). Bestaande
    /// annotaties horen bij de oude mesh en worden gewist.
    #[wasm_bindgen]
    pub fn load_mesh(&mut self, positions: &[f64], indices: Vec<u32>) -> Result<(), JsValue> {
        let mesh = SurfaceMesh::from_flat(positions, indices).map_err(to_js_error)?;
        self.load_surface(mesh).map_err(to_js_error)
    }

    /// Laad de standaard torus van de viewer.
    #[wasm_bindgen]
    pub fn load_torus(
        &mut self,
        radius: f64,
        tube: f64,
        radial_segments: usize,
        tubular_segments: usize,
    ) -> Result<(), JsValue> {
        let mesh = SurfaceMesh::torus(radius, tube, radial_segments, tubular_segments);
        self.load_surface(mesh).map_err(to_js_error)
    }

    /// Zet de camera vanuit een `CameraSettings`-object.
    #[wasm_bindgen]
    pub fn set_camera(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let settings: CameraSettings =
            serde_wasm_bindgen::from_value(settings).map_err(to_js_error)?;
        self.apply_camera(settings).map_err(to_js_error)
    }

    /// Zet vorm, projectiemodus en toggles. Een ongeldige combinatie wordt
    /// geweigerd en de vorige configuratie blijft staan.
    #[wasm_bindgen]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: SessionConfig = serde_wasm_bindgen::from_value(config).map_err(to_js_error)?;
        self.apply_config(config).map(|_| ()).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn set_sampling(&mut self, options: JsValue) -> Result<(), JsValue> {
        let options: SamplingOptions =
            serde_wasm_bindgen::from_value(options).map_err(to_js_error)?;
        self.session.set_sampling(options).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.pointer(PointerPhase::Down, Vec2::new(x, y))
            .map(|_| ())
            .map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.pointer(PointerPhase::Move, Vec2::new(x, y))
            .map(|_| ())
            .map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn pointer_up(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.pointer(PointerPhase::Up, Vec2::new(x, y))
            .map(|_| ())
            .map_err(to_js_error)
    }

    /// Schakel de orbitmodus; geeft de nieuwe stand terug.
    #[wasm_bindgen]
    pub fn toggle_orbit(&mut self) -> bool {
        self.session.toggle_orbit()
    }

    #[wasm_bindgen]
    pub fn complete(&mut self) -> Result<(), JsValue> {
        self.commit().map(|_| ()).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn cancel(&mut self) {
        self.session.cancel();
    }

    /// Wis ook de vastgelegde annotaties.
    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.session.clear();
    }

    #[wasm_bindgen]
    pub fn vertex_count(&self) -> usize {
        self.session.vertex_count()
    }

    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.session.state())
    }

    /// Haalt de scènegeometrie op in een "diff" formaat.
    #[wasm_bindgen]
    pub fn get_geometry(&mut self) -> Result<JsValue, JsValue> {
        let diff = self.geometry_diff();
        serde_wasm_bindgen::to_value(&diff).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Diagnostiek van de laatst gesamplede vorm, of `null`.
    #[wasm_bindgen]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.last_diagnostics())
            .map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Schermpositie van een wereldpunt, bijvoorbeeld voor labels.
    #[wasm_bindgen]
    pub fn project_to_screen(&self, x: f64, y: f64, z: f64) -> Option<Vec<f64>> {
        self.camera
            .project_to_ndc(Point3::new(x, y, z))
            .map(|ndc| vec![ndc.x, ndc.y])
    }
}

impl Engine {
    pub fn load_surface(&mut self, mesh: SurfaceMesh) -> Result<(), EngineError> {
        let surface = MeshSurface::new(mesh)?;
        log::debug!("loaded surface with {} triangles", surface.triangle_count());
        self.surface = Some(surface);
        self.session.clear();
        Ok(())
    }

    pub fn apply_camera(&mut self, settings: CameraSettings) -> Result<(), EngineError> {
        self.camera = Camera::new(settings)?;
        Ok(())
    }

    pub fn apply_config(&mut self, config: SessionConfig) -> Result<SessionState, EngineError> {
        Ok(self.session.set_config(config)?)
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[must_use]
    pub fn session(&self) -> &AnnotationSession {
        &self.session
    }

    #[must_use]
    pub fn last_diagnostics(&self) -> Option<&SamplingDiagnostics> {
        self.session.last_diagnostics()
    }

    pub fn press(&mut self, ndc: Vec2) -> Result<SessionState, EngineError> {
        self.pointer(PointerPhase::Down, ndc)
    }

    pub fn hover(&mut self, ndc: Vec2) -> Result<SessionState, EngineError> {
        self.pointer(PointerPhase::Move, ndc)
    }

    pub fn release(&mut self, ndc: Vec2) -> Result<SessionState, EngineError> {
        self.pointer(PointerPhase::Up, ndc)
    }

    pub fn commit(&mut self) -> Result<SessionState, EngineError> {
        let surface = self.surface.as_ref().ok_or(EngineError::NoSurface)?;
        let ctx = SketchContext::new(surface, &self.camera);
        Ok(self.session.complete(ctx)?)
    }

    /// Rebuild the scene and report what changed since the last call.
    pub fn geometry_diff(&mut self) -> GeometryDiff {
        let session = &self.session;
        let scene = self
            .metrics
            .time(TimingBucket::SessionRebuild, || session.geometry());

        let mut diff = GeometryDiff::default();
        let mut next_scene_map = BTreeMap::new();
        for (key, item) in &scene {
            match self.scene_map.get(key) {
                Some(existing) if existing == item => {}
                Some(_) => diff.updated.push(GeometryDiffItem {
                    id: key.to_string(),
                    item: item.clone(),
                }),
                None => diff.added.push(GeometryDiffItem {
                    id: key.to_string(),
                    item: item.clone(),
                }),
            }
            next_scene_map.insert(*key, item.clone());
        }

        for key in self.scene_map.keys() {
            if !next_scene_map.contains_key(key) {
                diff.removed.push(key.to_string());
            }
        }

        self.scene_map = next_scene_map;
        diff
    }

    /// Session timings plus scene rebuilds, when `sketch_metrics` is on.
    #[must_use]
    pub fn timing(&self) -> Option<SketchTimingReport> {
        let own = self.metrics.end()?;
        let mut report = self.session.timing().unwrap_or_default();
        report.add(TimingBucket::SessionRebuild, own.session_rebuild_ns);
        Some(report)
    }

    fn pointer(&mut self, phase: PointerPhase, ndc: Vec2) -> Result<SessionState, EngineError> {
        let surface = self.surface.as_ref().ok_or(EngineError::NoSurface)?;
        let ctx = SketchContext::new(surface, &self.camera);
        let state = match phase {
            PointerPhase::Down => self.session.pointer_down(ctx, ndc),
            PointerPhase::Move => self.session.pointer_move(ctx, ndc),
            PointerPhase::Up => self.session.pointer_up(ctx, ndc),
        }?;
        Ok(state)
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
