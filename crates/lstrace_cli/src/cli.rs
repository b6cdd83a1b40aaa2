use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use lstrace_math::DVec3;
use lstrace_renderer::{
    PerspectiveCamera, Rgba, SphereLevelSet, DEFAULT_APERTURE, DEFAULT_FAR_PLANE,
    DEFAULT_FOCAL_LENGTH, DEFAULT_FRAME_WIDTH, DEFAULT_NEAR_PLANE,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("expected perspective or orthographic camera, got \"{0}\"")]
    UnknownCamera(String),

    #[error("expected WIDTHxHEIGHT or WIDTH,HEIGHT, got \"{0}\"")]
    BadResolution(String),

    #[error("expected {expected} comma-separated numbers, got \"{value}\"")]
    BadNumbers { expected: &'static str, value: String },

    #[error("expected width > 0 and height > 0, got {width}x{height}")]
    EmptyImage { width: usize, height: usize },

    #[error("expected at least one sample per pixel")]
    NoSamples,

    #[error("expected 0 < near < far, got near = {near}, far = {far}")]
    BadClipping { near: f64, far: f64 },

    #[error("expected {name} > 0, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("expected 0 < fov < 180, got {0}")]
    BadFieldOfView(f64),

    #[error("unsupported image file format ({0}), only .ppm is written")]
    UnsupportedFormat(PathBuf),
}

/// Projection used to generate primary rays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKind {
    Perspective,
    Orthographic,
}

/// Anything starting with "persp" or "ortho" is accepted.
impl FromStr for CameraKind {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("persp") {
            Ok(CameraKind::Perspective)
        } else if lower.starts_with("ortho") {
            Ok(CameraKind::Orthographic)
        } else {
            Err(OptionsError::UnknownCamera(s.to_string()))
        }
    }
}

impl fmt::Display for CameraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraKind::Perspective => write!(f, "perspective"),
            CameraKind::Orthographic => write!(f, "orthographic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShaderKind {
    /// Flat white
    Matte,
    /// Surface normal mapped to RGB
    Normal,
    /// Headlight diffuse
    Diffuse,
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Matte => write!(f, "matte"),
            ShaderKind::Normal => write!(f, "normal"),
            ShaderKind::Diffuse => write!(f, "diffuse"),
        }
    }
}

/// Command line arguments structure using clap derive macros
#[derive(Parser, Debug)]
#[command(name = "lstrace")]
#[command(about = "Ray-trace a level set sphere into a PPM image")]
pub struct Args {
    /// Output image path ending in .ppm (any case).
    ///
    /// The extension is normalised, so out.PPM is written as out.ppm.
    pub output: PathBuf,

    /// Camera projection (perspective or orthographic)
    #[arg(long, default_value = "perspective")]
    pub camera: CameraKind,

    #[arg(long, value_enum, default_value_t = ShaderKind::Diffuse)]
    pub shader: ShaderKind,

    /// Width in mm of the visible frame (perspective only)
    #[arg(long, default_value_t = DEFAULT_APERTURE)]
    pub aperture: f64,

    /// Focal length in mm (perspective only)
    #[arg(long, conflicts_with = "fov")]
    pub focal: Option<f64>,

    /// Horizontal field of view in degrees (perspective only)
    #[arg(long)]
    pub fov: Option<f64>,

    /// Width of the visible frame in world units (orthographic only)
    #[arg(long, default_value_t = DEFAULT_FRAME_WIDTH)]
    pub frame: f64,

    #[arg(long, default_value_t = DEFAULT_NEAR_PLANE)]
    pub near: f64,

    #[arg(long, default_value_t = DEFAULT_FAR_PLANE, hide_default_value = true)]
    pub far: f64,

    /// Image resolution as WIDTHxHEIGHT
    #[arg(long, default_value = "2048x1024", value_parser = parse_resolution)]
    pub res: (usize, usize),

    /// Camera rotation in degrees as X,Y,Z (applied X, then Y, then Z)
    #[arg(long, short = 'r', default_value = "0,0,0", value_parser = parse_vec3, allow_hyphen_values = true)]
    pub rotate: DVec3,

    /// Camera position as X,Y,Z
    #[arg(long, short = 't', default_value = "0,0,0", value_parser = parse_vec3, allow_hyphen_values = true)]
    pub translate: DVec3,

    /// Samples per pixel
    #[arg(long, short = 's', default_value_t = 1)]
    pub samples: usize,

    /// Seed for the subpixel jitter table
    #[arg(long, default_value_t = 0)]
    pub seed: u32,

    /// Worker threads: 0 uses every core, 1 renders on the calling thread
    #[arg(long, default_value_t = 0)]
    pub cpus: usize,

    /// Sphere to render as X,Y,Z,RADIUS
    #[arg(long, default_value = "0,0,-5,1", value_parser = parse_sphere, allow_hyphen_values = true)]
    pub sphere: SphereLevelSet,

    /// Background color as R,G,B
    #[arg(long, default_value = "0,0,0", value_parser = parse_rgb)]
    pub background: Rgba,

    /// Draw a checkerboard behind the volume instead of a flat background
    #[arg(long)]
    pub checkerboard: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

/// Validated render settings
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub output: PathBuf,
    pub camera: CameraKind,
    pub shader: ShaderKind,
    pub aperture: f64,
    pub focal: f64,
    pub frame: f64,
    pub near: f64,
    pub far: f64,
    pub width: usize,
    pub height: usize,
    pub rotate: DVec3,
    pub translate: DVec3,
    pub samples: usize,
    pub seed: u32,
    pub cpus: usize,
    pub sphere: SphereLevelSet,
    pub background: Rgba,
    pub checkerboard: bool,
}

impl Args {
    /// Check the arguments and resolve the focal length.
    pub fn resolve(self) -> Result<RenderOptions, OptionsError> {
        let (width, height) = self.res;
        if width == 0 || height == 0 {
            return Err(OptionsError::EmptyImage { width, height });
        }
        if self.samples == 0 {
            return Err(OptionsError::NoSamples);
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(OptionsError::BadClipping {
                near: self.near,
                far: self.far,
            });
        }
        positive("aperture", self.aperture)?;
        positive("frame", self.frame)?;

        let focal = match (self.fov, self.focal) {
            (Some(fov), _) => {
                if !(fov > 0.0 && fov < 180.0) {
                    return Err(OptionsError::BadFieldOfView(fov));
                }
                PerspectiveCamera::field_of_view_to_focal_length(fov, self.aperture)
            }
            (None, Some(focal)) => focal,
            (None, None) => DEFAULT_FOCAL_LENGTH,
        };
        positive("focal", focal)?;

        if !has_ppm_extension(&self.output) {
            return Err(OptionsError::UnsupportedFormat(self.output));
        }

        Ok(RenderOptions {
            output: self.output,
            camera: self.camera,
            shader: self.shader,
            aperture: self.aperture,
            focal,
            frame: self.frame,
            near: self.near,
            far: self.far,
            width,
            height,
            rotate: self.rotate,
            translate: self.translate,
            samples: self.samples,
            seed: self.seed,
            cpus: self.cpus,
            sphere: self.sphere,
            background: self.background,
            checkerboard: self.checkerboard,
        })
    }
}

impl RenderOptions {
    /// Output path without its `.ppm` extension, as [`Film::save_ppm`] adds one
    /// in lower case.
    ///
    /// [`Film::save_ppm`]: lstrace_renderer::Film::save_ppm
    pub fn output_stem(&self) -> PathBuf {
        self.output.with_extension("")
    }
}

impl fmt::Display for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "output: {}", self.output.display())?;
        writeln!(f, "camera: {}", self.camera)?;
        writeln!(f, "shader: {}", self.shader)?;
        match self.camera {
            CameraKind::Perspective => {
                writeln!(f, "aperture: {}", self.aperture)?;
                writeln!(
                    f,
                    "focal: {} ({:.3} degree fov)",
                    self.focal,
                    PerspectiveCamera::focal_length_to_field_of_view(self.focal, self.aperture)
                )?;
            }
            CameraKind::Orthographic => writeln!(f, "frame: {}", self.frame)?,
        }
        writeln!(f, "near: {}", self.near)?;
        writeln!(f, "far: {}", self.far)?;
        writeln!(f, "res: {}x{}", self.width, self.height)?;
        writeln!(f, "rotate: {}", fmt_vec3(self.rotate))?;
        writeln!(f, "translate: {}", fmt_vec3(self.translate))?;
        writeln!(f, "samples: {}", self.samples)?;
        writeln!(f, "seed: {}", self.seed)?;
        writeln!(f, "cpus: {}", self.cpus)?;
        write!(
            f,
            "sphere: {}, radius {}",
            fmt_vec3(self.sphere.center()),
            self.sphere.radius()
        )
    }
}

fn fmt_vec3(v: DVec3) -> String {
    format!("{},{},{}", v.x, v.y, v.z)
}

fn positive(name: &'static str, value: f64) -> Result<(), OptionsError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(OptionsError::NotPositive { name, value })
    }
}

fn has_ppm_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ppm"))
}

fn parse_numbers<const N: usize>(s: &str, expected: &'static str) -> Result<[f64; N], OptionsError> {
    let bad = || OptionsError::BadNumbers {
        expected,
        value: s.to_string(),
    };

    let mut out = [0.0; N];
    let mut count = 0;
    for part in s.split(',') {
        if count == N {
            return Err(bad());
        }
        out[count] = part.trim().parse().map_err(|_| bad())?;
        count += 1;
    }
    if count != N {
        return Err(bad());
    }
    Ok(out)
}

pub fn parse_resolution(s: &str) -> Result<(usize, usize), OptionsError> {
    let bad = || OptionsError::BadResolution(s.to_string());
    let (w, h) = s
        .split_once(['x', 'X', ','])
        .ok_or_else(bad)?;
    let width = w.trim().parse().map_err(|_| bad())?;
    let height = h.trim().parse().map_err(|_| bad())?;
    Ok((width, height))
}

pub fn parse_vec3(s: &str) -> Result<DVec3, OptionsError> {
    parse_numbers::<3>(s, "3").map(DVec3::from_array)
}

pub fn parse_sphere(s: &str) -> Result<SphereLevelSet, OptionsError> {
    let [x, y, z, r] = parse_numbers::<4>(s, "4")?;
    if r <= 0.0 {
        return Err(OptionsError::NotPositive {
            name: "radius",
            value: r,
        });
    }
    Ok(SphereLevelSet::new(DVec3::new(x, y, z), r))
}

pub fn parse_rgb(s: &str) -> Result<Rgba, OptionsError> {
    let [r, g, b] = parse_numbers::<3>(s, "3")?;
    Ok(Rgba::rgb(r as f32, g as f32, b as f32))
}
