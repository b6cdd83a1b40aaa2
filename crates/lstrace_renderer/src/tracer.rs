//! Multi-threaded level set ray tracer.
//!
//! [`RenderConfig`] owns everything a render needs: the intersector and
//! shader templates, the sample count and the jitter table, plus a borrowed
//! camera. [`RenderConfig::trace`] splits the image into row bands and
//! renders each on a [`RenderContext`], a short-lived view of the config
//! with its own copies of the shader and intersector.
//!
//! Rays that miss the volume keep the film's existing pixel value, so fill
//! the film with a background before tracing.

use crate::partition::{default_rows_per_partition, partition_rows, RowPartition};
use crate::{Camera, Film, Ray, Rgba, Shader, VolumeIntersector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Number of precomputed jitter offsets. Must be a power of two.
pub const JITTER_TABLE_SIZE: usize = 16;
const JITTER_MASK: usize = JITTER_TABLE_SIZE - 1;

/// Sub-pixel offsets in [0, 1) for jittered supersampling.
#[derive(Debug, Clone, PartialEq)]
pub struct JitterTable {
    offsets: [f64; JITTER_TABLE_SIZE],
}

impl JitterTable {
    /// Generate the table from `seed`. The same seed always yields the same table.
    pub fn new(seed: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(u64::from(seed));
        let mut offsets = [0.0; JITTER_TABLE_SIZE];
        for offset in offsets.iter_mut() {
            *offset = rng.gen::<f64>();
        }
        Self { offsets }
    }

    /// Offset for a running sample counter; wraps every 16 entries.
    #[inline]
    pub fn offset(&self, counter: usize) -> f64 {
        self.offsets[counter & JITTER_MASK]
    }

    pub fn offsets(&self) -> &[f64; JITTER_TABLE_SIZE] {
        &self.offsets
    }
}

/// Jitter counter at the first pixel of `start_row` in a top-to-bottom pass.
///
/// Every sub-sample advances the counter by two. Starting each band where a
/// sequential pass would be makes the output independent of partitioning.
/// Only the low four bits are ever used, so wrapping is harmless.
#[inline]
fn first_jitter_counter(start_row: usize, width: usize, sub_pixels: usize) -> usize {
    start_row
        .wrapping_mul(width)
        .wrapping_mul(sub_pixels)
        .wrapping_mul(2)
}

/// Render settings and the resources shared by all partitions.
pub struct RenderConfig<'cam, I: VolumeIntersector> {
    intersector: I,
    shader: Box<dyn Shader>,
    camera: &'cam dyn Camera,
    pixel_samples: usize,
    jitter: Option<JitterTable>,
}

impl<'cam, I: VolumeIntersector> RenderConfig<'cam, I> {
    /// Create a config from a prebuilt intersector.
    ///
    /// The shader is cloned; the camera is borrowed for the lifetime of the config.
    ///
    /// # Panics
    /// If `pixel_samples` is zero.
    pub fn new(
        intersector: I,
        shader: &dyn Shader,
        camera: &'cam dyn Camera,
        pixel_samples: usize,
        seed: u32,
    ) -> Self {
        let mut config = Self {
            intersector,
            shader: shader.clone_box(),
            camera,
            pixel_samples: 1,
            jitter: None,
        };
        config.set_pixel_samples(pixel_samples, seed);
        config
    }

    /// Create a config that builds its intersector from `grid`.
    ///
    /// # Panics
    /// If `pixel_samples` is zero.
    pub fn from_grid(
        grid: &I::Grid,
        shader: &dyn Shader,
        camera: &'cam dyn Camera,
        pixel_samples: usize,
        seed: u32,
    ) -> Self {
        Self::new(I::from_grid(grid), shader, camera, pixel_samples, seed)
    }

    pub fn set_grid(&mut self, grid: &I::Grid) {
        self.intersector = I::from_grid(grid);
    }

    pub fn set_intersector(&mut self, intersector: I) {
        self.intersector = intersector;
    }

    pub fn set_shader(&mut self, shader: &dyn Shader) {
        self.shader = shader.clone_box();
    }

    pub fn set_camera(&mut self, camera: &'cam dyn Camera) {
        self.camera = camera;
    }

    /// Set the number of rays per pixel.
    ///
    /// With more than one sample the jitter table is regenerated from
    /// `seed`; with exactly one it is dropped.
    ///
    /// # Panics
    /// If `pixel_samples` is zero.
    pub fn set_pixel_samples(&mut self, pixel_samples: usize, seed: u32) {
        assert!(pixel_samples > 0, "pixel_samples must be at least 1");
        self.pixel_samples = pixel_samples;
        self.jitter = (pixel_samples > 1).then(|| JitterTable::new(seed));
    }

    pub fn pixel_samples(&self) -> usize {
        self.pixel_samples
    }

    pub fn jitter(&self) -> Option<&JitterTable> {
        self.jitter.as_ref()
    }

    /// Render the whole image into `film`.
    ///
    /// With `threaded` the row bands run on the current rayon pool;
    /// otherwise they run one after another on the calling thread. Both
    /// produce identical pixels.
    ///
    /// # Panics
    /// If the film's resolution differs from the camera's.
    pub fn trace(&self, film: &mut Film, threaded: bool) {
        let workers = if threaded { rayon::current_num_threads() } else { 1 };
        let rows = default_rows_per_partition(film.height(), workers);
        self.trace_partitioned(film, rows, threaded);
    }

    /// Render into `film` using bands of at most `rows_per_partition` rows.
    ///
    /// # Panics
    /// If the film's resolution differs from the camera's, or
    /// `rows_per_partition` is zero.
    pub fn trace_partitioned(&self, film: &mut Film, rows_per_partition: usize, threaded: bool) {
        assert!(
            film.width() == self.camera.width() && film.height() == self.camera.height(),
            "film is {}x{} but the camera was built for {}x{}",
            film.width(),
            film.height(),
            self.camera.width(),
            self.camera.height()
        );

        // A band never needs more rows than the image has.
        let rows_per_partition = rows_per_partition.min(film.height().max(1));
        let partitions = partition_rows(film.height(), rows_per_partition);
        let band_len = film.width() * rows_per_partition;
        if partitions.is_empty() || band_len == 0 {
            return;
        }

        log::debug!(
            "Tracing {}x{} @ {} spp in {} partitions ({})",
            film.width(),
            film.height(),
            self.pixel_samples,
            partitions.len(),
            if threaded { "threaded" } else { "sequential" }
        );

        let pixels = film.pixels_mut();
        if threaded {
            pixels
                .par_chunks_mut(band_len)
                .zip(partitions.par_iter())
                .for_each(|(band, partition)| self.context().render_partition(partition, band));
        } else {
            for (band, partition) in pixels.chunks_mut(band_len).zip(&partitions) {
                self.context().render_partition(partition, band);
            }
        }
    }

    /// A fresh per-partition context.
    pub fn context(&self) -> RenderContext<'_, 'cam, I> {
        RenderContext::new(self)
    }
}

/// Per-partition render state.
///
/// Reads camera, sample count and jitter table from its config, and shades
/// with private copies of the shader and intersector. Cheap to create;
/// contexts only live for the duration of one trace.
pub struct RenderContext<'a, 'cam, I: VolumeIntersector> {
    config: &'a RenderConfig<'cam, I>,
    intersector: I,
    shader: Box<dyn Shader>,
}

impl<'a, 'cam, I: VolumeIntersector> RenderContext<'a, 'cam, I> {
    pub fn new(config: &'a RenderConfig<'cam, I>) -> Self {
        Self {
            config,
            intersector: config.intersector.clone(),
            shader: config.shader.clone_box(),
        }
    }

    /// Render the rows of `partition` into `pixels`.
    ///
    /// `pixels` holds exactly those rows of the film, row-major. Each pixel
    /// is read as the background for missed rays, then overwritten with
    /// the average of its samples.
    pub fn render_partition(&mut self, partition: &RowPartition, pixels: &mut [Rgba]) {
        let config = self.config;
        let camera = config.camera;
        let width = camera.width();
        assert_eq!(
            pixels.len(),
            partition.row_count() * width,
            "pixel slice does not match partition {}",
            partition.index
        );
        if width == 0 {
            return;
        }

        let sub_pixels = config.pixel_samples - 1;
        let frac = 1.0f32 / (1.0 + sub_pixels as f32);
        let mut n = first_jitter_counter(partition.start, width, sub_pixels);

        for (row, row_pixels) in partition.rows().zip(pixels.chunks_mut(width)) {
            for (col, pixel) in row_pixels.iter_mut().enumerate() {
                let background = *pixel;
                let ray = camera.get_center_ray(col, row);
                let mut color = self.sample(&ray, background);

                if let Some(jitter) = config.jitter.as_ref() {
                    for _ in 0..sub_pixels {
                        let ray = camera.get_ray(
                            col,
                            row,
                            jitter.offset(n),
                            jitter.offset(n.wrapping_add(1)),
                        );
                        color += self.sample(&ray, background);
                        n = n.wrapping_add(2);
                    }
                }

                *pixel = color * frac;
            }
        }
    }

    #[inline]
    fn sample(&mut self, ray: &Ray, background: Rgba) -> Rgba {
        match self.intersector.intersects_ws(ray) {
            Some(hit) => self.shader.shade(hit.point, hit.normal, ray),
            None => background,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DiffuseShader, MatteShader, NormalShader, OrthographicCamera, PerspectiveCamera,
        SphereIntersector, SphereLevelSet, SurfaceHit,
    };
    use lstrace_math::DVec3;
    use std::sync::Mutex;

    /// A volume with no surface anywhere.
    #[derive(Clone)]
    struct EmptyVolume;

    impl VolumeIntersector for EmptyVolume {
        type Grid = ();

        fn from_grid(_grid: &()) -> Self {
            EmptyVolume
        }

        fn intersects_ws(&mut self, _ray: &Ray) -> Option<SurfaceHit> {
            None
        }
    }

    /// Records every ray request; rays point at nothing.
    struct RecordingCamera {
        width: usize,
        height: usize,
        requests: Mutex<Vec<(usize, usize, f64, f64)>>,
    }

    impl RecordingCamera {
        fn new(width: usize, height: usize) -> Self {
            Self {
                width,
                height,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn take(&self) -> Vec<(usize, usize, f64, f64)> {
            std::mem::take(&mut *self.requests.lock().unwrap())
        }
    }

    impl Camera for RecordingCamera {
        fn get_ray(&self, col: usize, row: usize, col_offset: f64, row_offset: f64) -> Ray {
            self.requests
                .lock()
                .unwrap()
                .push((col, row, col_offset, row_offset));
            Ray::new(DVec3::ZERO, DVec3::NEG_Z, 1e-3, 1.0)
        }

        fn width(&self) -> usize {
            self.width
        }

        fn height(&self) -> usize {
            self.height
        }
    }

    fn sphere_grid() -> SphereLevelSet {
        SphereLevelSet::new(DVec3::ZERO, 1.0)
    }

    /// A film with a checkerboard background and odd dimensions.
    fn background_film() -> Film {
        let mut film = Film::new(37, 23);
        film.checkerboard(Rgba::gray(0.25), Rgba::gray(0.75), 4);
        film
    }

    #[test]
    fn test_background_passthrough() {
        let mut film = Film::new(9, 7);
        let background = Rgba::new(0.2, 0.3, 0.4, 0.5);
        film.fill(background);
        let camera = PerspectiveCamera::with_placement(&film, DVec3::ZERO, DVec3::ZERO);

        let config = RenderConfig::<EmptyVolume>::from_grid(&(), &MatteShader::default(), &camera, 1, 0);
        config.trace(&mut film, true);

        assert!(film.pixels().iter().all(|p| *p == background));
    }

    #[test]
    fn test_background_passthrough_supersampled() {
        let mut film = background_film();
        let reference = film.clone();
        let camera = PerspectiveCamera::with_placement(&film, DVec3::ZERO, DVec3::ZERO);

        let config = RenderConfig::new(EmptyVolume, &MatteShader::default(), &camera, 4, 3);
        config.trace(&mut film, false);

        assert_eq!(film.pixels(), reference.pixels());
    }

    #[test]
    fn test_single_sample_has_no_jitter() {
        let film = Film::new(4, 4);
        let camera = PerspectiveCamera::with_placement(&film, DVec3::ZERO, DVec3::ZERO);
        let mut config = RenderConfig::new(EmptyVolume, &MatteShader::default(), &camera, 1, 9);

        assert!(config.jitter().is_none());

        config.set_pixel_samples(4, 9);
        assert_eq!(config.jitter(), Some(&JitterTable::new(9)));

        config.set_pixel_samples(1, 9);
        assert!(config.jitter().is_none());
    }

    #[test]
    fn test_single_sample_matches_primary_ray() {
        let mut film = background_film();
        let camera = PerspectiveCamera::with_placement(&film, DVec3::ZERO, DVec3::new(0.0, 0.0, 4.0));
        let shader = NormalShader::default();
        let grid = sphere_grid();

        let mut expected = film.clone();
        let mut inter = SphereIntersector::from_grid(&grid);
        for row in 0..film.height() {
            for col in 0..film.width() {
                let ray = camera.get_center_ray(col, row);
                if let Some(hit) = inter.intersects_ws(&ray) {
                    *expected.pixel_mut(col, row) = shader.shade(hit.point, hit.normal, &ray);
                }
            }
        }

        let config = RenderConfig::<SphereIntersector>::from_grid(&grid, &shader, &camera, 1, 0);
        config.trace(&mut film, true);

        assert_eq!(film.pixels(), expected.pixels());
        assert_ne!(film.pixels(), background_film().pixels(), "sphere should be visible");
    }

    #[test]
    fn test_jitter_table_is_seeded() {
        let a = JitterTable::new(42);
        let b = JitterTable::new(42);
        let c = JitterTable::new(43);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.offsets().iter().all(|o| (0.0..1.0).contains(o)));
        assert_eq!(a.offset(3), a.offset(3 + JITTER_TABLE_SIZE));
    }

    #[test]
    #[should_panic(expected = "pixel_samples")]
    fn test_zero_samples_panics() {
        let film = Film::new(2, 2);
        let camera = OrthographicCamera::with_placement(&film, DVec3::ZERO, DVec3::ZERO);
        RenderConfig::new(EmptyVolume, &MatteShader::default(), &camera, 0, 0);
    }

    #[test]
    #[should_panic(expected = "camera was built for")]
    fn test_film_camera_mismatch_panics() {
        let small = Film::new(2, 2);
        let mut large = Film::new(4, 4);
        let camera = OrthographicCamera::with_placement(&small, DVec3::ZERO, DVec3::ZERO);

        let config = RenderConfig::new(EmptyVolume, &MatteShader::default(), &camera, 1, 0);
        config.trace(&mut large, false);
    }

    #[test]
    fn test_subsample_offsets_follow_jitter_counter() {
        let film_dims = (3, 2);
        let camera = RecordingCamera::new(film_dims.0, film_dims.1);
        let config = RenderConfig::new(EmptyVolume, &MatteShader::default(), &camera, 3, 5);
        let jitter = JitterTable::new(5);

        let mut expected = Vec::new();
        let mut n = 0;
        for row in 0..film_dims.1 {
            for col in 0..film_dims.0 {
                expected.push((col, row, 0.5, 0.5));
                for _ in 0..2 {
                    expected.push((col, row, jitter.offset(n), jitter.offset(n + 1)));
                    n += 2;
                }
            }
        }

        let mut film = Film::new(film_dims.0, film_dims.1);
        config.trace_partitioned(&mut film, 2, false);
        assert_eq!(camera.take(), expected);

        // One band per row picks up the counter where the previous row left off.
        config.trace_partitioned(&mut film, 1, false);
        assert_eq!(camera.take(), expected);
    }

    #[test]
    fn test_supersampled_full_coverage_is_exact() {
        let mut film = Film::new(8, 8);
        let camera = OrthographicCamera::new(&film, DVec3::ZERO, DVec3::ZERO, 4.0, 1e-3, 100.0);
        let grid = SphereLevelSet::new(DVec3::new(0.0, 0.0, -20.0), 10.0);
        let red = Rgba::rgb(1.0, 0.0, 0.0);

        let config = RenderConfig::<SphereIntersector>::from_grid(&grid, &MatteShader::new(red), &camera, 4, 1);
        config.trace(&mut film, true);

        assert!(film.pixels().iter().all(|p| *p == red));
    }

    #[test]
    fn test_supersampling_blends_silhouette() {
        let mut film = Film::new(32, 32);
        let camera = OrthographicCamera::new(&film, DVec3::ZERO, DVec3::ZERO, 4.0, 1e-3, 100.0);
        let grid = SphereLevelSet::new(DVec3::new(0.0, 0.0, -5.0), 1.3);

        let config =
            RenderConfig::<SphereIntersector>::from_grid(&grid, &MatteShader::default(), &camera, 16, 2);
        config.trace(&mut film, true);

        // Black background, white sphere: edge pixels end up somewhere in between.
        let blended = film
            .pixels()
            .iter()
            .filter(|p| p.r > 0.0 && p.r < 1.0)
            .count();
        assert!(blended > 0);
        assert_eq!(*film.pixel(16, 16), Rgba::WHITE);
        assert_eq!(*film.pixel(0, 0), Rgba::BLACK);
    }

    fn determinism_scene<'cam>(camera: &'cam PerspectiveCamera) -> RenderConfig<'cam, SphereIntersector> {
        RenderConfig::from_grid(&sphere_grid(), &DiffuseShader::new(Rgba::rgb(0.9, 0.6, 0.3)), camera, 5, 17)
    }

    #[test]
    fn test_deterministic_across_partitions() {
        let mut reference = background_film();
        let camera = PerspectiveCamera::with_placement(
            &reference,
            DVec3::new(-10.0, 20.0, 0.0),
            DVec3::new(1.5, 1.0, 4.0),
        );
        let config = determinism_scene(&camera);
        let height = reference.height();
        config.trace_partitioned(&mut reference, height, false);

        for rows in [1, 2, 3, 7, 22, 23, 100] {
            for threaded in [false, true] {
                let mut film = background_film();
                config.trace_partitioned(&mut film, rows, threaded);
                assert_eq!(
                    film.pixels(),
                    reference.pixels(),
                    "rows_per_partition={rows}, threaded={threaded}"
                );
            }
        }
    }

    #[test]
    fn test_band_taller_than_image() {
        let mut reference = background_film();
        let camera = PerspectiveCamera::with_placement(&reference, DVec3::ZERO, DVec3::new(0.0, 0.0, 4.0));
        let config = determinism_scene(&camera);
        config.trace(&mut reference, false);

        for threaded in [false, true] {
            let mut film = background_film();
            config.trace_partitioned(&mut film, usize::MAX / 2, threaded);
            assert_eq!(film.pixels(), reference.pixels(), "threaded={threaded}");
        }
    }

    #[test]
    fn test_deterministic_across_worker_counts() {
        let mut reference = background_film();
        let camera = PerspectiveCamera::with_placement(&reference, DVec3::ZERO, DVec3::new(0.3, -0.2, 4.0));
        let config = determinism_scene(&camera);
        config.trace(&mut reference, false);

        for threads in [1, 2, 3, 8] {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            let mut film = background_film();
            pool.install(|| config.trace(&mut film, true));

            assert_eq!(film.pixels(), reference.pixels(), "threads={threads}");
        }
    }

    #[test]
    fn test_mutators_rebuild_state() {
        let film = Film::new(8, 8);
        let camera = OrthographicCamera::new(&film, DVec3::ZERO, DVec3::ZERO, 4.0, 1e-3, 100.0);
        let other_camera =
            OrthographicCamera::new(&film, DVec3::ZERO, DVec3::new(100.0, 0.0, 0.0), 4.0, 1e-3, 100.0);
        let grid = SphereLevelSet::new(DVec3::new(0.0, 0.0, -20.0), 10.0);

        let mut config =
            RenderConfig::<SphereIntersector>::from_grid(&grid, &MatteShader::default(), &camera, 1, 0);

        fn render(config: &RenderConfig<'_, SphereIntersector>) -> Film {
            let mut out = Film::with_background(8, 8, Rgba::BLACK);
            config.trace(&mut out, false);
            out
        }

        assert_eq!(*render(&config).pixel(4, 4), Rgba::WHITE);

        config.set_shader(&MatteShader::new(Rgba::rgb(0.0, 1.0, 0.0)));
        assert_eq!(*render(&config).pixel(4, 4), Rgba::rgb(0.0, 1.0, 0.0));

        // Moved far away from the sphere: nothing but background.
        config.set_camera(&other_camera);
        assert_eq!(*render(&config).pixel(4, 4), Rgba::BLACK);

        config.set_camera(&camera);
        config.set_grid(&SphereLevelSet::new(DVec3::new(0.0, 50.0, -20.0), 1.0));
        assert_eq!(*render(&config).pixel(4, 4), Rgba::BLACK);

        config.set_intersector(SphereIntersector::new(grid));
        assert_eq!(*render(&config).pixel(4, 4), Rgba::rgb(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_first_jitter_counter() {
        assert_eq!(first_jitter_counter(0, 10, 3), 0);
        assert_eq!(first_jitter_counter(2, 10, 3), 120);
        assert_eq!(first_jitter_counter(5, 10, 0), 0);
    }
}
