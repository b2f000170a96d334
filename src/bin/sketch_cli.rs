#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("sketch_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    use surface_sketch::geom::{Camera, MeshSurface, Point3, SurfaceMesh, Vec2};
    use surface_sketch::sketch::{
        Annotation, AnnotationSession, ProjectionMode, SamplingDiagnostics, SamplingOptions,
        SessionConfig, ShapeKind, SketchContext,
    };

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"sketch_cli (surface-sketch)

USAGE:
  sketch_cli list
  sketch_cli run <scenario|all> [options]

SCENARIOS:
  rectangle_on_plane
  circle_on_torus
  polygon_on_torus
  spline_on_plane

OPTIONS (run):
  --out-dir <dir>    Write <scenario>.obj and/or <scenario>.snap to this dir (required for `all`)
  --obj <path>       Write OBJ polylines (single scenario only)
  --snap <path>      Write snapshot (single scenario only)
  --no-obj           Skip OBJ when using --out-dir
  --no-snap          Skip snapshot when using --out-dir
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut write_obj = true;
        let mut write_snap = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--overwrite" => overwrite = true,
                "--no-obj" => write_obj = false,
                "--no-snap" => write_snap = false,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --obj/--snap (not both)".to_string());
            }
            if !write_obj && !write_snap {
                return Err("nothing to write (both --no-obj and --no-snap set)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(*scenario, dir, write_obj, write_snap, overwrite)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(scenario, dir, write_obj, write_snap, overwrite);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario =
            Scenario::from_str(scenario_name.as_str()).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario)?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &output.annotations, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        report(&output);
        Ok(())
    }

    fn run_one_scenario_to_dir(
        scenario: Scenario,
        dir: &Path,
        write_obj: bool,
        write_snap: bool,
        overwrite: bool,
    ) -> Result<(), String> {
        let output = run_scenario(scenario)?;

        if write_snap {
            let path = dir.join(format!("{}.snap", output.name));
            write_text_file(&path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if write_obj {
            let path = dir.join(format!("{}.obj", output.name));
            write_obj_file(&path, &output.annotations, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        report(&output);
        Ok(())
    }

    fn report(output: &ScenarioOutput) {
        let points: usize = output.annotations.iter().map(Annotation::len).sum();
        eprintln!(
            "{}: annotations={} points={} | {}",
            output.name,
            output.annotations.len(),
            points,
            output.diagnostics.summary()
        );
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        let _ = writeln!(msg, "unknown scenario `{name}`\n\navailable scenarios:");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    fn refuse_overwrite(path: &Path, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        Ok(())
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        refuse_overwrite(path, overwrite)?;
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    /// Annotations as OBJ line elements; a closed loop repeats its first vertex.
    fn write_obj_file(
        path: &Path,
        annotations: &[Annotation],
        name: &str,
        overwrite: bool,
    ) -> Result<(), String> {
        refuse_overwrite(path, overwrite)?;

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# surface-sketch sketch_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        let mut base = 1usize;
        for annotation in annotations {
            for p in annotation.points() {
                writeln!(w, "v {} {} {}", p.x, p.y, p.z).map_err(|e| format!("write obj: {e}"))?;
            }

            let mut line: Vec<String> = (base..base + annotation.len()).map(|i| i.to_string()).collect();
            if annotation.is_closed() && annotation.len() > 1 {
                line.push(base.to_string());
            }
            if line.len() > 1 {
                writeln!(w, "l {}", line.join(" ")).map_err(|e| format!("write obj: {e}"))?;
            }
            base += annotation.len();
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == 0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_point_line(out: &mut String, prefix: &str, p: Point3) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, p.x);
        out.push(' ');
        write_f64(out, p.y);
        out.push(' ');
        write_f64(out, p.z);
        out.push('\n');
    }

    fn write_diagnostics(out: &mut String, diag: &SamplingDiagnostics) {
        let _ = writeln!(out, "diag.evaluated {}", diag.evaluated_count);
        let _ = writeln!(out, "diag.projected {}", diag.projected_count);
        let _ = writeln!(out, "diag.missed {}", diag.missed_count);
        let _ = writeln!(out, "diag.warnings {}", diag.warnings.len());
        for warning in &diag.warnings {
            let _ = writeln!(out, "w {warning}");
        }
    }

    fn write_annotations(out: &mut String, annotations: &[Annotation]) {
        let _ = writeln!(out, "annotations {}", annotations.len());
        for (idx, annotation) in annotations.iter().enumerate() {
            let _ = writeln!(
                out,
                "annotation {idx} points {} closed {}",
                annotation.len(),
                annotation.is_closed()
            );
            for p in annotation.points() {
                write_point_line(out, "p", *p);
            }
        }
    }

    fn snapshot(scenario: &str, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# surface-sketch snapshot v1");
        let _ = writeln!(out, "scenario {scenario}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        RectangleOnPlane,
        CircleOnTorus,
        PolygonOnTorus,
        SplineOnPlane,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::RectangleOnPlane,
            Scenario::CircleOnTorus,
            Scenario::PolygonOnTorus,
            Scenario::SplineOnPlane,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::RectangleOnPlane => "rectangle_on_plane",
                Scenario::CircleOnTorus => "circle_on_torus",
                Scenario::PolygonOnTorus => "polygon_on_torus",
                Scenario::SplineOnPlane => "spline_on_plane",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Self::ALL.iter().copied().find(|scenario| scenario.name() == name)
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        annotations: Vec<Annotation>,
        diagnostics: SamplingDiagnostics,
        snapshot: String,
    }

    /// A canned gesture: press every click in order, then complete.
    struct Gesture {
        mesh: SurfaceMesh,
        config: SessionConfig,
        clicks: &'static [[f64; 2]],
    }

    fn run_scenario(scenario: Scenario) -> Result<ScenarioOutput, String> {
        let gesture = match scenario {
            Scenario::RectangleOnPlane => Gesture {
                mesh: SurfaceMesh::plane(2.0, 8),
                config: SessionConfig::new(ShapeKind::Rectangle, ProjectionMode::TangentNearestPoint)
                    .with_axis_aligned(true),
                clicks: &[[-0.15, -0.1], [0.15, 0.12]],
            },
            Scenario::CircleOnTorus => Gesture {
                mesh: viewer_torus(),
                config: SessionConfig::new(ShapeKind::Circle, ProjectionMode::TangentCameraRay)
                    .with_center_anchored(true),
                clicks: &[[0.7, 0.0], [0.78, 0.0]],
            },
            Scenario::PolygonOnTorus => Gesture {
                mesh: viewer_torus(),
                config: SessionConfig::new(ShapeKind::Polygon, ProjectionMode::ScreenSpace),
                clicks: &[[-0.75, -0.1], [-0.6, -0.1], [-0.6, 0.1], [-0.75, 0.1]],
            },
            Scenario::SplineOnPlane => Gesture {
                mesh: SurfaceMesh::plane(2.0, 8),
                config: SessionConfig::new(ShapeKind::Spline, ProjectionMode::TangentCameraRay),
                clicks: &[[-0.2, 0.0], [-0.1, 0.15], [0.05, -0.1], [0.2, 0.05]],
            },
        };

        let name = scenario.name();
        let (annotations, diagnostics) = draw(gesture)?;
        let snap = snapshot(name, |out| {
            write_diagnostics(out, &diagnostics);
            write_annotations(out, &annotations);
        });

        Ok(ScenarioOutput {
            name,
            annotations,
            diagnostics,
            snapshot: snap,
        })
    }

    fn viewer_torus() -> SurfaceMesh {
        SurfaceMesh::torus(2.0, 1.0, 32, 64)
    }

    fn draw(gesture: Gesture) -> Result<(Vec<Annotation>, SamplingDiagnostics), String> {
        let surface = MeshSurface::new(gesture.mesh).map_err(|e| e.to_string())?;
        let camera = Camera::default();
        let ctx = SketchContext::new(&surface, &camera);
        let mut session = AnnotationSession::with_config(gesture.config, SamplingOptions::default())
            .map_err(|e| e.to_string())?;

        for &[x, y] in gesture.clicks {
            let ndc = Vec2::new(x, y);
            session.pointer_down(ctx, ndc).map_err(|e| e.to_string())?;
            session.pointer_up(ctx, ndc).map_err(|e| e.to_string())?;
        }
        session.complete(ctx).map_err(|e| e.to_string())?;

        let annotations: Vec<Annotation> = session.committed_annotations().cloned().collect();
        let diagnostics = session.last_diagnostics().cloned().unwrap_or_default();
        Ok((annotations, diagnostics))
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
