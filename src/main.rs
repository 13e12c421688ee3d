use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, warn};
use meshpoint::image2d::Image;
use meshpoint::io::{obj::load_obj, ply::save_ply, png::load_texture};
use meshpoint::model::Model;
use meshpoint::render::{render_to_png, RenderParams};
use meshpoint::sample::{
    calibrate, sample_area_subdiv, sample_edge_subdiv, sample_face, sample_grid, sample_map,
    sample_prnd, AreaSubdivParams, Calibration, EdgeSubdivParams, FaceParams, GridParams,
    ParamKind, PrndParams, SampleStats,
};
use nalgebra::{Point3, Vector3};

fn parse_vec3(s: &str) -> Result<Vector3<f32>, String> {
    let parts: Vec<f32> = s
        .split_whitespace()
        .map(|p| p.parse::<f32>().map_err(|e| format!("bad component '{p}': {e}")))
        .collect::<Result<_, _>>()?;
    if parts.len() != 3 {
        return Err(format!("expected 3 components, got {}", parts.len()));
    }
    Ok(Vector3::new(parts[0], parts[1], parts[2]))
}

fn parse_rgba(s: &str) -> Result<Rgba, String> {
    let parts: Vec<u8> = s
        .split_whitespace()
        .map(|p| p.parse::<u8>().map_err(|e| format!("bad channel '{p}': {e}")))
        .collect::<Result<_, _>>()?;
    if parts.len() != 4 {
        return Err(format!("expected 4 channels, got {}", parts.len()));
    }
    Ok(Rgba([parts[0], parts[1], parts[2], parts[3]]))
}

#[derive(Debug, Clone, Copy)]
struct Rgba([u8; 4]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Face-uniform edge walk.
    Face,
    /// Grid-line ray casting.
    Grid,
    /// One sample per referenced texel.
    Map,
    /// Area-threshold midpoint subdivision.
    Sdiv,
    /// Edge-length subdivision.
    Ediv,
    /// Quasi-random R2 placement.
    Prnd,
}

#[derive(Parser, Debug)]
#[command(name = "meshpoint")]
#[command(about = "Deterministic mesh sampling and software rasterization")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a mesh into a point cloud.
    Sample(SampleArgs),
    /// Render a mesh to a PNG through the orthographic rasterizer.
    Render(RenderArgs),
}

#[derive(clap::Args, Debug)]
struct SampleArgs {
    /// Input OBJ mesh.
    input: String,

    /// Output PLY point cloud.
    output: String,

    /// Texture image resolving sample colors through the mesh UVs.
    #[arg(long)]
    texture: Option<String>,

    #[arg(long, value_enum, default_value_t = Mode::Face)]
    mode: Mode,

    /// Steps along the bounding-box diagonal (face mode).
    #[arg(long, default_value_t = 1024)]
    resolution: u32,

    /// Explicit world-space step overriding --resolution (face mode).
    #[arg(long)]
    float_step: Option<f32>,

    /// Half-extent of the normal sweep, in world units (face mode).
    #[arg(long, default_value_t = 0.0)]
    thickness: f32,

    /// Cells per bounding-box axis (grid mode).
    #[arg(long, default_value_t = 1024)]
    grid_size: u32,

    /// Cast only along the axis closest to each face normal (grid mode).
    #[arg(long)]
    use_normal: bool,

    /// Keep the true bounding box instead of expanding it to a cube
    /// (grid mode).
    #[arg(long)]
    no_cubical: bool,

    /// Area threshold (sdiv mode) or edge-length threshold (ediv mode).
    #[arg(long, default_value_t = 0.001)]
    threshold: f32,

    /// Also split until neighbor corners map to adjacent texels (sdiv
    /// mode).
    #[arg(long)]
    map_threshold: bool,

    /// Total point budget (prnd mode).
    #[arg(long, default_value_t = 1_000_000)]
    target_count: usize,

    /// Lower bound of the calibrated point-count window; 0 disables
    /// calibration.
    #[arg(long, default_value_t = 0)]
    nb_samples_min: usize,

    /// Upper bound of the calibrated point-count window.
    #[arg(long, default_value_t = 0)]
    nb_samples_max: usize,

    #[arg(long, default_value_t = 10)]
    max_iterations: u32,

    /// Nearest-texel texture lookups instead of bilinear filtering.
    #[arg(long)]
    nearest: bool,
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    /// Input OBJ mesh.
    input: String,

    /// Output PNG image.
    output: String,

    #[arg(long)]
    texture: Option<String>,

    #[arg(long, default_value_t = 1920)]
    width: usize,

    #[arg(long, default_value_t = 1080)]
    height: usize,

    /// View direction as "x y z".
    #[arg(long, default_value = "0 0 -1", value_parser = parse_vec3)]
    view_dir: Vector3<f32>,

    /// View up vector as "x y z".
    #[arg(long, default_value = "0 1 0", value_parser = parse_vec3)]
    view_up: Vector3<f32>,

    /// Background as "r g b a".
    #[arg(long, default_value = "0 0 0 0", value_parser = parse_rgba)]
    clear_color: Rgba,

    #[arg(long)]
    cull_faces: bool,

    /// Treat clockwise screen winding as front-facing when culling.
    #[arg(long)]
    clockwise: bool,

    #[arg(long)]
    lighting: bool,

    /// Explicit light position as "x y z"; derived from the bounding
    /// sphere when absent.
    #[arg(long, value_parser = parse_vec3)]
    light_position: Option<Vector3<f32>>,

    /// Brighten covered pixels until the brightest channel saturates.
    #[arg(long)]
    auto_level: bool,

    /// Canonicalize vertex and face enumeration before rendering.
    #[arg(long)]
    canonicalize: bool,

    #[arg(long)]
    nearest: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let result = match args.command {
        Commands::Sample(args) => run_sample(args),
        Commands::Render(args) => run_render(args),
    };
    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn load_optional_texture(path: &Option<String>) -> Result<Image, String> {
    match path {
        Some(p) => load_texture(p),
        None => Ok(Image::empty()),
    }
}

fn run_sample(args: SampleArgs) -> Result<(), String> {
    let input = load_obj(&args.input)?;
    let texture = load_optional_texture(&args.texture)?;
    let bilinear = !args.nearest;

    let mut output = Model::new();
    let calibrated = args.nb_samples_min > 0 && args.nb_samples_max > args.nb_samples_min;
    let stats = if calibrated {
        run_calibrated(&args, &input, &texture, bilinear, &mut output)?
    } else {
        run_mode(&args, &input, &texture, bilinear, &mut output)
    };
    stats.log(&format!("{:?}", args.mode).to_lowercase());

    save_ply(&output, &args.output)
}

fn run_mode(
    args: &SampleArgs,
    input: &Model,
    texture: &Image,
    bilinear: bool,
    output: &mut Model,
) -> SampleStats {
    match args.mode {
        Mode::Face => sample_face(
            input,
            texture,
            &FaceParams {
                resolution: args.resolution,
                float_step: args.float_step,
                thickness: args.thickness,
                bilinear,
            },
            output,
        ),
        Mode::Grid => sample_grid(
            input,
            texture,
            &GridParams {
                grid_size: args.grid_size,
                use_normal: args.use_normal,
                cubical: !args.no_cubical,
                bilinear,
            },
            output,
        ),
        Mode::Map => sample_map(input, texture, output),
        Mode::Sdiv => sample_area_subdiv(
            input,
            texture,
            &AreaSubdivParams {
                threshold: args.threshold,
                map_threshold: args.map_threshold,
                bilinear,
            },
            output,
        ),
        Mode::Ediv => sample_edge_subdiv(
            input,
            texture,
            &EdgeSubdivParams {
                threshold: args.threshold,
                bilinear,
            },
            output,
        ),
        Mode::Prnd => sample_prnd(
            input,
            texture,
            &PrndParams {
                target_count: args.target_count,
                bilinear,
            },
            output,
        ),
    }
}

/// Drives the selected mode through the bisection search until the point
/// count lands in the requested window. Supported for the modes whose
/// count responds monotonically to a single parameter.
fn run_calibrated(
    args: &SampleArgs,
    input: &Model,
    texture: &Image,
    bilinear: bool,
    output: &mut Model,
) -> Result<SampleStats, String> {
    let cal = Calibration {
        target_min: args.nb_samples_min,
        target_max: args.nb_samples_max,
        max_iterations: args.max_iterations,
    };
    let diagonal = input.bbox().size().norm();

    let mut stats = SampleStats::default();
    let result = match args.mode {
        Mode::Face => calibrate(ParamKind::Resolution, args.resolution as f32, &cal, |p| {
            *output = Model::new();
            let params = FaceParams {
                resolution: 1,
                float_step: Some(diagonal / p),
                thickness: args.thickness,
                bilinear,
            };
            stats = sample_face(input, texture, &params, output);
            output.vertex_count()
        }),
        Mode::Grid => calibrate(
            ParamKind::Resolution,
            args.grid_size as f32,
            &cal,
            |p| {
                *output = Model::new();
                let params = GridParams {
                    grid_size: p.round().max(1.0) as u32,
                    use_normal: args.use_normal,
                    cubical: !args.no_cubical,
                    bilinear,
                };
                stats = sample_grid(input, texture, &params, output);
                output.vertex_count()
            },
        ),
        Mode::Sdiv => calibrate(ParamKind::Threshold, args.threshold, &cal, |p| {
            *output = Model::new();
            let params = AreaSubdivParams {
                threshold: p,
                map_threshold: args.map_threshold,
                bilinear,
            };
            stats = sample_area_subdiv(input, texture, &params, output);
            output.vertex_count()
        }),
        Mode::Ediv => calibrate(ParamKind::Threshold, args.threshold, &cal, |p| {
            *output = Model::new();
            let params = EdgeSubdivParams {
                threshold: p,
                bilinear,
            };
            stats = sample_edge_subdiv(input, texture, &params, output);
            output.vertex_count()
        }),
        mode => {
            return Err(format!(
                "calibration is not supported for mode {mode:?}; \
                 set the point budget directly"
            ))
        }
    };

    if result.converged {
        info!(
            "calibration converged after {} iterations: param {} -> {} points",
            result.iterations, result.param, result.points
        );
    } else {
        warn!(
            "calibration stopped at the iteration cap with {} points (window {}..{})",
            result.points, cal.target_min, cal.target_max
        );
    }
    Ok(stats)
}

fn run_render(args: RenderArgs) -> Result<(), String> {
    let model = load_obj(&args.input)?;
    let texture = load_optional_texture(&args.texture)?;

    let params = RenderParams {
        width: args.width,
        height: args.height,
        view_dir: args.view_dir,
        view_up: args.view_up,
        bbox: None,
        clear_color: args.clear_color.0,
        cull_faces: args.cull_faces,
        clockwise: args.clockwise,
        lighting: args.lighting,
        light_position: args.light_position.map(Point3::from),
        light_dir: Vector3::new(1.0, 1.0, 1.0),
        auto_level: args.auto_level,
        canonicalize: args.canonicalize,
        bilinear: !args.nearest,
    };
    render_to_png(&model, &texture, &params, &args.output)
}
