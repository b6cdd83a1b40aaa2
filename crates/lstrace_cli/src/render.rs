//! Builds the scene described by [`RenderOptions`] and renders it.

use std::time::Instant;

use anyhow::Result;
use lstrace_renderer::{
    ray_trace, Camera, DiffuseShader, Film, MatteShader, NormalShader, OrthographicCamera,
    PerspectiveCamera, Rgba, Shader, SphereIntersector,
};

use crate::cli::{CameraKind, RenderOptions, ShaderKind};

const CHECKER_SIZE: usize = 16;

pub fn make_film(opts: &RenderOptions) -> Film {
    let mut film = Film::new(opts.width, opts.height);
    if opts.checkerboard {
        film.checkerboard(opts.background, opts.background * 0.5 + Rgba::gray(0.5) * 0.5, CHECKER_SIZE);
    } else {
        film.fill(opts.background);
    }
    film
}

pub fn make_camera(opts: &RenderOptions, film: &Film) -> Box<dyn Camera> {
    match opts.camera {
        CameraKind::Perspective => Box::new(PerspectiveCamera::new(
            film,
            opts.rotate,
            opts.translate,
            opts.focal,
            opts.aperture,
            opts.near,
            opts.far,
        )),
        CameraKind::Orthographic => Box::new(OrthographicCamera::new(
            film,
            opts.rotate,
            opts.translate,
            opts.frame,
            opts.near,
            opts.far,
        )),
    }
}

pub fn make_shader(kind: ShaderKind) -> Box<dyn Shader> {
    match kind {
        ShaderKind::Matte => Box::new(MatteShader::default()),
        ShaderKind::Normal => Box::new(NormalShader::default()),
        ShaderKind::Diffuse => Box::new(DiffuseShader::default()),
    }
}

/// Render the sphere into a new film.
///
/// `cpus` of 0 uses rayon's global pool, 1 traces on the calling thread,
/// anything else runs in a dedicated pool of that size.
pub fn render(opts: &RenderOptions) -> Result<Film> {
    let mut film = make_film(opts);
    let camera = make_camera(opts, &film);
    let shader = make_shader(opts.shader);

    let start = Instant::now();
    let trace = |film: &mut Film, threaded: bool| {
        ray_trace::<SphereIntersector>(
            &opts.sphere,
            shader.as_ref(),
            camera.as_ref(),
            film,
            opts.samples,
            opts.seed,
            threaded,
        )
    };

    match opts.cpus {
        0 => trace(&mut film, true),
        1 => trace(&mut film, false),
        n => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
            pool.install(|| trace(&mut film, true));
        }
    }

    log::info!(
        "Rendered {}x{} at {} spp in {:.2?}",
        film.width(),
        film.height(),
        opts.samples,
        start.elapsed()
    );
    Ok(film)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    fn options(extra: &[&str]) -> RenderOptions {
        let mut argv = vec!["lstrace", "out.ppm", "--res", "32x16"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap().resolve().unwrap()
    }

    #[test]
    fn test_render_sphere_in_view() {
        let opts = options(&["--sphere", "0,0,-5,1", "--background", "0,0,1"]);
        let film = render(&opts).unwrap();

        assert_eq!((film.width(), film.height()), (32, 16));
        // Middle of the frame looks straight at the sphere.
        assert!(film.pixel(16, 8).r > 0.5);
        assert_eq!(*film.pixel(0, 0), Rgba::rgb(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_thread_counts_agree() {
        let renders: Vec<Film> = ["0", "1", "3"]
            .iter()
            .map(|&cpus| {
                let opts = options(&["--cpus", cpus, "--samples", "4", "--shader", "normal"]);
                render(&opts).unwrap()
            })
            .collect();

        assert_eq!(renders[0].pixels(), renders[1].pixels());
        assert_eq!(renders[1].pixels(), renders[2].pixels());
    }

    #[test]
    fn test_orthographic_misses_offset_sphere() {
        // A unit-wide orthographic frame can't see a sphere 10 units to the side.
        let opts = options(&["--camera", "ortho", "--sphere", "10,0,-5,1"]);
        let film = render(&opts).unwrap();
        assert!(film.pixels().iter().all(|p| *p == Rgba::BLACK));
    }

    #[test]
    fn test_checkerboard_background() {
        let opts = options(&["--checkerboard", "--sphere", "100,0,-5,1"]);
        let film = render(&opts).unwrap();
        assert_ne!(film.pixel(0, 0), film.pixel(CHECKER_SIZE, 0));
    }

    #[test]
    fn test_render_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("sphere.ppm");
        let opts = Args::try_parse_from([
            "lstrace",
            output.to_str().unwrap(),
            "--res",
            "8x4",
            "--shader",
            "matte",
        ])
        .unwrap()
        .resolve()
        .unwrap();

        let film = render(&opts).unwrap();
        let path = film.save_ppm(opts.output_stem()).unwrap();

        assert_eq!(path, output);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"P6\n8 4\n255\n"));
        assert_eq!(bytes.len(), b"P6\n8 4\n255\n".len() + 8 * 4 * 3);
    }

    #[test]
    fn test_upper_case_extension_is_normalised() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("sphere.PPM");
        let opts = Args::try_parse_from(["lstrace", output.to_str().unwrap(), "--res", "4x2"])
            .unwrap()
            .resolve()
            .unwrap();

        let path = render(&opts).unwrap().save_ppm(opts.output_stem()).unwrap();

        assert_eq!(path, dir.path().join("sphere.ppm"));
        assert!(path.is_file());
    }
}
